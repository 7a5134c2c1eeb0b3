//! Thin binary that exercises the agent decision core: wires a [`MockLlm`] and the
//! reference tool set into the flow engine and drives one request to completion.

mod log_format;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use loom::core::state::{AgentCallbacks, CostGuard, GuardrailState, StepHistory};
use loom::core::{build_flow, AgentConfig, AgentState};
use loom::llm::{LlmClient, MockLlm};
use loom::memory::{InMemoryPlanStore, InMemoryWalkthroughStore};
use loom::stream::ToolStreamWriter;
use loom::tools::{reference_registry, McpServerListTool, UpdatePlanTool, WalkthroughTool};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[derive(Parser, Debug)]
#[command(name = "loom")]
#[command(about = "Loom — exercise the agent decision core from the command line")]
struct Args {
    /// User message (the problem the agent should work on).
    #[arg(trailing_var_arg = true)]
    message: Vec<String>,

    /// Working folder for file tools; defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    working_folder: Option<PathBuf>,

    /// Session id; scopes the plan and walkthrough stores. Random when omitted.
    #[arg(long, value_name = "ID")]
    session_id: Option<String>,

    /// Canned model reply to script through MockLlm, repeatable. When omitted the model
    /// answers the problem text verbatim.
    #[arg(long = "reply", value_name = "TEXT")]
    replies: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(log_format::TextWithSpanIds::new()).with_filter(filter))
        .try_init();
}

fn build_llm(problem: &str, replies: Vec<String>) -> Arc<dyn LlmClient> {
    if replies.is_empty() {
        Arc::new(MockLlm::new(vec![MockLlm::text(format!(
            "```yaml\naction: answer\nanswer: {problem}\n```"
        ))]))
    } else {
        Arc::new(MockLlm::new(replies.into_iter().map(MockLlm::text).collect()))
    }
}

/// Avoids pulling in the `uuid` crate for a CLI-only concern that doesn't need global
/// uniqueness guarantees, just a reasonably unique local id.
fn local_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("session-{nanos:x}")
}

#[tokio::main]
async fn main() {
    let _ = config::load_and_apply("loom", None);
    init_logging();

    let args = Args::parse();
    let problem = if args.message.is_empty() { "say hi".to_string() } else { args.message.join(" ") };
    let session_id = args.session_id.unwrap_or_else(local_session_id);
    let working_folder = Arc::new(args.working_folder.unwrap_or_else(|| PathBuf::from(".")));

    let agent_config = AgentConfig::from_env();
    let plan_store = Arc::new(InMemoryPlanStore::new());
    let walkthrough_store = Arc::new(InMemoryWalkthroughStore::new());

    let base_registry = reference_registry(working_folder.clone(), "bash");
    let meta_tools: Vec<Arc<dyn loom::tool::Tool>> = vec![
        Arc::new(UpdatePlanTool::new(plan_store.clone(), session_id.clone())),
        Arc::new(WalkthroughTool::new(walkthrough_store.clone(), session_id.clone())),
        Arc::new(McpServerListTool::new(Vec::new())),
    ];
    let tool_registry = base_registry.with_extra(meta_tools);

    let llm = build_llm(&problem, args.replies);

    let mut state = AgentState {
        problem: problem.clone(),
        history: StepHistory::new(),
        tool_registry,
        thinking_mode: agent_config.thinking_mode,
        tool_call_mode: agent_config.tool_call_mode,
        context_window_tokens: agent_config.context_window_tokens,
        os_name: std::env::consts::OS.to_string(),
        shell_cmd: "bash".to_string(),
        model_name: agent_config.model_name.clone(),
        conversation_prefix: String::new(),
        working_folder: Some(working_folder.display().to_string()),
        last_decision: None,
        guardrails: GuardrailState::default(),
        cost_guard: Arc::new(CostGuard::new(agent_config.agent_token_budget, agent_config.agent_duration_limit_secs)),
        read_cache: loom::core::cache::ReadCache::new(),
        plan_store,
        walkthrough_store,
        session_id,
        callbacks: AgentCallbacks::default(),
        stream_writer: ToolStreamWriter::noop(),
        max_agent_steps: agent_config.max_agent_steps,
        prompt_tokens_total: 0,
        completion_tokens_total: 0,
    };

    let flow = build_flow(llm, None);
    if let Err(err) = flow.run(&mut state, || false).await {
        eprintln!("agent run failed: {err}");
        std::process::exit(1);
    }

    for step in state.history.as_slice() {
        println!("[{:>3}] {:<7} {}", step.step_number, step.kind.as_str(), step.action);
        if let Some(output) = &step.output {
            println!("      {output}");
        }
    }
}
