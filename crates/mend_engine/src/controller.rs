//! The repair loop: choose a strategy, apply it, validate in the sandbox,
//! and keep going until the program runs clean or the budget is spent.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use mend_detector::{apply_patches, inspect_and_test, Inspection};
use mend_errors::{choose_fix_method, parse_diagnostic, ErrorKind, FixMethod, Language};
use mend_fixer::{apply_ssr, clean_completion, fix_structured, merge_completion};
use mend_python_ast::parses;
use mend_runtime::{Executor, RunOutput, TextCompletion};

use crate::diff::change_entries;
use crate::intent::detect_intent_conflicts;
use crate::normalize_source;
use crate::prompt::{build_prompt, summarize_conflicts, summarize_issues};
use crate::report::{timestamp_now, ChangeEntry, FinalStatus, IterationRecord, Report};
use crate::settings::Settings;
use crate::validate::is_success;

/// Budget for the detector's dynamic test harness. Deliberately tighter
/// than the sandbox budget: the synthesized checks are tiny.
const HARNESS_TIMEOUT: Duration = Duration::from_secs(1);

static FORCED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^# repair attempt \d+: no effective change\n").unwrap());

fn forced_marker(iteration: usize) -> String {
    format!("# repair attempt {iteration}: no effective change\n")
}

/// Per-call knobs for [`Engine::repair`].
#[derive(Debug, Default)]
pub struct RepairOptions {
    /// Override the configured iteration cap.
    pub max_iterations: Option<usize>,
    /// Remove forced-difference markers from the final source on success.
    pub strip_markers: bool,
    /// Where to persist the report; `None` keeps it in memory only.
    pub report_dir: Option<PathBuf>,
}

/// What one single-shot execution produced, with classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub error_kind: ErrorKind,
    pub diagnostic: String,
}

/// The result of a full repair run.
#[derive(Debug)]
pub struct RepairOutcome {
    pub final_source: String,
    pub status: FinalStatus,
    pub report: Report,
    pub report_path: Option<PathBuf>,
}

pub struct Engine<'a> {
    executor: &'a dyn Executor,
    model: &'a dyn TextCompletion,
    settings: Settings,
}

impl<'a> Engine<'a> {
    pub fn new(
        executor: &'a dyn Executor,
        model: &'a dyn TextCompletion,
        settings: Settings,
    ) -> Self {
        Self {
            executor,
            model,
            settings,
        }
    }

    /// Execute once and classify, the shape a `/run` front end returns.
    pub fn run_once(&self, source: &str, language: Language) -> Result<RunOutcome> {
        let output = self
            .executor
            .run(source, language, self.settings.sandbox_timeout)
            .context("sandbox execution failed")?;
        let (error_kind, diagnostic) = parse_diagnostic(&output.stderr, language);
        Ok(RunOutcome {
            stdout: output.stdout,
            stderr: output.stderr,
            error_kind,
            diagnostic,
        })
    }

    /// Run the repair loop, the shape a `/repair` front end returns.
    pub fn repair(
        &self,
        source: &str,
        user_prompt: &str,
        options: &RepairOptions,
    ) -> Result<RepairOutcome> {
        let mut current = normalize_source(source);
        let mut iterations: Vec<IterationRecord> = Vec::new();
        let mut changes: Vec<ChangeEntry> = Vec::new();
        let max_iterations = options.max_iterations.unwrap_or(self.settings.max_iterations);
        let harness_timeout = HARNESS_TIMEOUT.min(self.settings.sandbox_timeout);

        // Pre-iteration: when the code plainly contradicts its own intent,
        // a structured pass cannot help; go straight to the model.
        let conflicts = detect_intent_conflicts(&current);
        if !conflicts.is_empty() {
            info!("semantic intent conflict detected; applying generative rewrite");
            let mut next = normalize_source(&self.intent_rewrite(&current, &conflicts, user_prompt));
            if next == current {
                next.push_str(&forced_marker(0));
            }
            changes.extend(change_entries(
                &current,
                &next,
                0,
                FixMethod::Generative,
                ErrorKind::Logical,
                "semantic intent conflict",
            ));

            let (output, execution_time) = self.execute_or_synthesize(&next);
            let (kind, _) = parse_diagnostic(&output.stderr, Language::Python);
            let success = is_success(&output.stderr, kind);
            iterations.push(IterationRecord {
                index: 0,
                timestamp: timestamp_now(),
                method: FixMethod::Generative,
                error_kind: kind,
                success,
                execution_time,
                stdout: output.stdout,
                stderr: output.stderr,
                code_snapshot: next.clone(),
            });
            let status = if success {
                FinalStatus::Success
            } else {
                FinalStatus::Failed
            };
            return self.finish(next, status, iterations, changes, options);
        }

        for index in 1..=max_iterations {
            info!("repair iteration {index}/{max_iterations}");

            // 1. Execute the current source.
            let output = match self
                .executor
                .run(&current, Language::Python, self.settings.sandbox_timeout)
            {
                Ok(output) => output,
                Err(error) => {
                    // Collaborator fault: no new code this iteration, but
                    // the marker keeps the loop terminating.
                    warn!("executor failed on iteration {index}: {error}");
                    let mut next = current.clone();
                    next.push_str(&forced_marker(index));
                    changes.extend(change_entries(
                        &current,
                        &next,
                        index,
                        FixMethod::None,
                        ErrorKind::Unknown,
                        "executor failure",
                    ));
                    iterations.push(IterationRecord {
                        index,
                        timestamp: timestamp_now(),
                        method: FixMethod::None,
                        error_kind: ErrorKind::Unknown,
                        success: false,
                        execution_time: None,
                        stdout: String::new(),
                        stderr: error.to_string(),
                        code_snapshot: next.clone(),
                    });
                    current = next;
                    continue;
                }
            };

            // 2. Classify, then look for silent logical bugs.
            let (mut kind, diagnostic) = parse_diagnostic(&output.stderr, Language::Python);
            let inspection = inspect_and_test(&current, self.executor, harness_timeout);
            if inspection.has_issues() {
                debug!("detector found {} issue(s)", inspection.issues.len());
                kind = ErrorKind::Logical;
            }

            // 3. Clean run and nothing asked of us: done.
            if kind == ErrorKind::None && user_prompt.trim().is_empty() {
                iterations.push(IterationRecord {
                    index,
                    timestamp: timestamp_now(),
                    method: FixMethod::None,
                    error_kind: ErrorKind::None,
                    success: is_success(&output.stderr, kind),
                    execution_time: None,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    code_snapshot: current.clone(),
                });
                return self.finish(current, FinalStatus::Success, iterations, changes, options);
            }

            // 4. Pick the strategy.
            let mut method = if !user_prompt.trim().is_empty() || kind == ErrorKind::Logical {
                FixMethod::Generative
            } else {
                choose_fix_method(kind)
            };
            debug!("iteration {index}: {kind} via {method}");

            let input = current.clone();

            // 5. Structural pre-pass.
            let mut working = apply_ssr(&current);

            // 6. High-confidence patches from the detector.
            working = apply_patches(&working, &inspection.issues);

            // 7. The chosen fixer.
            if method.is_structured() {
                let fixed = fix_structured(&working);
                if fixed == working {
                    debug!("structured fixer made no progress; downgrading to generative");
                    method = FixMethod::Generative;
                } else {
                    working = fixed;
                }
            }
            if method.is_generative() {
                working = self.generative_fix(&working, &diagnostic, &inspection, user_prompt);
            }

            // 8. Structural post-pass.
            working = normalize_source(&apply_ssr(&working));

            // Progress guarantee: no iteration leaves the source untouched.
            if working == input {
                working.push_str(&forced_marker(index));
            }

            // 9. Line-level change log for this iteration.
            changes.extend(change_entries(
                &input,
                &working,
                index,
                method,
                kind,
                &format!("{method} fix for {kind}"),
            ));

            // 10. Validate the result in the sandbox.
            let (new_output, execution_time) = self.execute_or_synthesize(&working);
            let (mut new_kind, _) = parse_diagnostic(&new_output.stderr, Language::Python);
            let new_inspection = inspect_and_test(&working, self.executor, harness_timeout);
            if new_inspection.has_issues() {
                new_kind = ErrorKind::Logical;
            }
            // A changed stdout under a non-logical error kind means the fix
            // had semantic effect; force a logical re-check next round.
            if new_output.stdout != output.stdout
                && !matches!(new_kind, ErrorKind::None | ErrorKind::Logical)
            {
                new_kind = ErrorKind::Logical;
            }

            // 11. A generative fix that now runs clean ends the loop.
            let success = method.is_generative()
                && new_kind == ErrorKind::None
                && is_success(&new_output.stderr, new_kind);

            iterations.push(IterationRecord {
                index,
                timestamp: timestamp_now(),
                method,
                error_kind: new_kind,
                success,
                execution_time,
                stdout: new_output.stdout,
                stderr: new_output.stderr,
                code_snapshot: working.clone(),
            });

            // 12. Continue from the new source.
            current = working;
            if success {
                return self.finish(current, FinalStatus::Success, iterations, changes, options);
            }
        }

        self.finish(current, FinalStatus::Failed, iterations, changes, options)
    }

    /// Generative rewrite for the intent pre-pass: full-rewrite merge,
    /// then extract-and-merge, then a bare parse fallback.
    fn intent_rewrite(&self, source: &str, conflicts: &[String], user_prompt: &str) -> String {
        let prompt = build_prompt(source, "", &summarize_conflicts(conflicts), user_prompt);
        let completion = match self.model.complete(&prompt, self.settings.model_max_tokens) {
            Ok(completion) => completion,
            Err(error) => {
                warn!("model call failed during intent rewrite: {error}");
                return source.to_string();
            }
        };

        let merged = merge_completion(source, &completion, true);
        if merged != source {
            return merged;
        }
        let extracted = clean_completion(&completion);
        if extracted.is_empty() {
            return source.to_string();
        }
        let merged = merge_completion(source, &extracted, true);
        if merged != source {
            return merged;
        }
        if parses(&extracted) {
            return extracted;
        }
        source.to_string()
    }

    /// The in-loop generative ladder: conservative merge, then a
    /// full-rewrite merge of the extracted snippet, then one more attempt
    /// when the snippet at least parses.
    fn generative_fix(
        &self,
        working: &str,
        diagnostic: &str,
        inspection: &Inspection,
        user_prompt: &str,
    ) -> String {
        let prompt = build_prompt(
            working,
            diagnostic,
            &summarize_issues(&inspection.issues),
            user_prompt,
        );
        let completion = match self.model.complete(&prompt, self.settings.model_max_tokens) {
            Ok(completion) => completion,
            Err(error) => {
                warn!("model call failed: {error}");
                return working.to_string();
            }
        };

        let merged = merge_completion(working, &completion, false);
        if merged != working {
            return merged;
        }
        let extracted = clean_completion(&completion);
        if extracted.is_empty() {
            debug!("completion contained no extractable code");
            return working.to_string();
        }
        let merged = merge_completion(working, &extracted, true);
        if merged != working {
            return merged;
        }
        if parses(&extracted) {
            let merged = merge_completion(working, &extracted, true);
            if merged != working {
                return merged;
            }
        }
        debug!("all merge attempts were no-ops");
        working.to_string()
    }

    /// Validation execution; a collaborator fault becomes a synthetic
    /// failing output rather than ending the run.
    fn execute_or_synthesize(&self, source: &str) -> (RunOutput, Option<f64>) {
        let started = Instant::now();
        match self
            .executor
            .run(source, Language::Python, self.settings.sandbox_timeout)
        {
            Ok(output) => (output, Some(started.elapsed().as_secs_f64())),
            Err(error) => {
                warn!("validation execution failed: {error}");
                (
                    RunOutput {
                        stdout: String::new(),
                        stderr: error.to_string(),
                    },
                    None,
                )
            }
        }
    }

    fn finish(
        &self,
        mut final_source: String,
        status: FinalStatus,
        iterations: Vec<IterationRecord>,
        changes: Vec<ChangeEntry>,
        options: &RepairOptions,
    ) -> Result<RepairOutcome> {
        if status == FinalStatus::Success && options.strip_markers {
            final_source = FORCED_MARKER.replace_all(&final_source, "").into_owned();
        }

        let report = Report::new(status, iterations, changes);
        let report_path = match &options.report_dir {
            Some(dir) => Some(
                report
                    .save(dir)
                    .context("failed to persist iteration report")?,
            ),
            None => None,
        };

        info!("repair finished: {status}");
        Ok(RepairOutcome {
            final_source,
            status,
            report,
            report_path,
        })
    }
}
