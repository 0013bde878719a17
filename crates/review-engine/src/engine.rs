use std::path::PathBuf;
use std::sync::Arc;

use review_agent::{build_execution_context, AgentBackend, AggregatorBackend, SelectorBackend};
use review_config::{load_agents, load_aggregator, load_selector, Config, ConfigOverrides};
use review_content::resolve_content;
use review_core::exit_code::ExitCode;
use review_core::report::EngineResult;
use review_core::target::ReviewTarget;
use review_prefetch::prefetch_selector_context;
use review_prompt::{build_selector_context_section, SelectorContextInput};

use crate::helpers::{build_agent_user_message, build_empty_engine_result, build_report, determine_exit_code, get_disabled_names};
use crate::shutdown::execute_with_shutdown_timeout;
use crate::signals::install_signal_handlers;

pub struct EngineDeps {
    pub project_root: PathBuf,
    pub custom_agents_dir: Option<PathBuf>,
    pub agent_backend: Arc<dyn AgentBackend>,
    pub selector_backend: Arc<dyn SelectorBackend>,
    pub aggregator_backend: Arc<dyn AggregatorBackend>,
}

/// Runs the whole review pipeline for `target`: resolve config, load
/// definitions, resolve content, prefetch context, run the selector,
/// build per-agent execution contexts, execute them (with graceful
/// shutdown), build the report, and optionally aggregate.
///
/// No step here ever returns a Rust `Result` all the way up — every
/// failure mode specified for this pipeline maps onto a specific
/// `ExitCode::ExecutionError` report instead, so the caller only has to
/// branch on the returned `EngineResult`.
pub async fn run_review(target: ReviewTarget, overrides: ConfigOverrides, deps: &EngineDeps) -> EngineResult {
    let config = match Config::load(&deps.project_root, &overrides) {
        Ok(config) => config,
        Err(err) => return build_empty_engine_result(vec![err.to_string()], ExitCode::ExecutionError),
    };

    let selector_definition = match load_selector(deps.custom_agents_dir.as_deref()) {
        Ok(def) => def,
        Err(err) => {
            eprintln!("Error: Failed to load selector definition: {err}\nHint: Check your selector.toml for syntax or validation errors.");
            return build_empty_engine_result(vec![err.to_string()], ExitCode::ExecutionError);
        }
    };

    let load_result = load_agents(deps.custom_agents_dir.as_deref());
    let disabled_names = get_disabled_names(&config);
    let load_result = review_config::filter_disabled_agents(load_result, &disabled_names);
    let load_errors: Vec<String> = load_result.errors.iter().map(|e| format!("{}: {}: {}", e.source, e.file, e.message)).collect();

    let resolved_content = match resolve_content(&target).await {
        Ok(content) => content,
        Err(err) => return build_empty_engine_result(append(load_errors, err.to_string()), ExitCode::ExecutionError),
    };

    let prefetched = match prefetch_selector_context(&target, &resolved_content, &config.selector.convention_files, &deps.project_root).await {
        Ok(prefetched) => prefetched,
        Err(err) => return build_empty_engine_result(append(load_errors, err.to_string()), ExitCode::ExecutionError),
    };

    let selector_output = match review_agent::run_selector(
        &target,
        &load_result.agents,
        &selector_definition,
        &config.selector,
        &config,
        &resolved_content,
        &prefetched,
        deps.selector_backend.as_ref(),
    )
    .await
    {
        Ok(output) => output,
        Err(err) => return build_empty_engine_result(append(load_errors, err.to_string()), ExitCode::ExecutionError),
    };

    if selector_output.selected_agents.is_empty() {
        return build_empty_engine_result(load_errors, ExitCode::Success);
    }

    let referenced_content: Vec<review_prefetch::PrefetchedReference> = selector_output
        .referenced_content
        .iter()
        .map(|r| review_prefetch::PrefetchedReference {
            reference_type: r.reference_type.clone(),
            reference_id: r.reference_id.clone(),
            content: r.content.clone(),
        })
        .collect();
    let context_section = build_selector_context_section(&SelectorContextInput {
        change_intent: &selector_output.change_intent,
        affected_files: &selector_output.affected_files,
        relevant_conventions: &selector_output.relevant_conventions,
        issue_context: &selector_output.issue_context,
        referenced_content: &referenced_content,
        referenced_content_max_chars: config.selector.referenced_content_max_chars,
    });

    let selected_defs = review_agent::resolve_selected_agents(&load_result.agents, &selector_output.selected_agents);

    let mut contexts = Vec::with_capacity(selected_defs.len());
    for def in selected_defs {
        let user_message = build_agent_user_message(&target, def, &resolved_content, &context_section);
        let agent_config = config.agents.get(&def.name);
        match build_execution_context(def, agent_config, &config, user_message) {
            Ok(ctx) => contexts.push(ctx),
            Err(err) => return build_empty_engine_result(append(load_errors, err.to_string()), ExitCode::ExecutionError),
        }
    }

    let (_sender, shutdown_rx, signal_handle) = install_signal_handlers();
    let backend = Arc::clone(&deps.agent_backend);
    let shutdown_for_executor = shutdown_rx.clone();
    let run_parallel = config.parallel;
    let sink = review_exec::new_result_sink();
    let sink_for_executor = Arc::clone(&sink);
    let executor = async move {
        if run_parallel {
            review_exec::execute_parallel(contexts, backend, &shutdown_for_executor, &sink_for_executor).await
        } else {
            review_exec::execute_sequential(contexts, backend, &shutdown_for_executor, &sink_for_executor).await
        }
    };
    let sink_for_partial = Arc::clone(&sink);
    let results = execute_with_shutdown_timeout(executor, shutdown_rx.clone(), move || review_exec::drain_sink(&sink_for_partial)).await;
    signal_handle.abort();

    let mut report = build_report(results, load_errors);

    let shutdown_fired = *shutdown_rx.borrow();
    if config.aggregation.enabled && !shutdown_fired {
        let valid_count = report.results.iter().filter(|r| r.is_valid()).count();
        if valid_count == 0 {
            // nothing to aggregate
        } else if valid_count == 1 {
            eprintln!("Aggregation skipped: only 1 valid result (no deduplication needed)");
        } else {
            match load_aggregator(deps.custom_agents_dir.as_deref()) {
                Ok(aggregator_definition) => {
                    match review_agent::run_aggregator(
                        &aggregator_definition,
                        &config.aggregation,
                        &config,
                        &report.results,
                        deps.aggregator_backend.as_ref(),
                    )
                    .await
                    {
                        Ok(aggregated) => report.aggregated = Some(aggregated),
                        Err(err) => {
                            tracing::warn!(error = %err, "aggregation failed");
                            report.aggregation_error = Some(err.to_string());
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load aggregator definition");
                    report.aggregation_error = Some(err.to_string());
                }
            }
        }
    }

    let exit_code = determine_exit_code(&report);
    EngineResult { report, exit_code }
}

fn append(mut errors: Vec<String>, extra: String) -> Vec<String> {
    errors.push(extra);
    errors
}
