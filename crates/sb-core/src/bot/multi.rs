//! Fan-out/fan-in over a set of bots.
//!
//! Every bot whose `has_react` matches runs on its own task, at most
//! `max_concurrent` at a time. Results are folded into one directive in
//! completion order; the loop only ends once every scheduled task has been
//! joined, so no in-flight result is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    bot::Handler,
    error_sink::ErrorReporter,
    errors::Error,
    model::{ResponseDirective, Update},
    Result,
};

/// Merged response plus the last error any bot returned.
///
/// A failing bot never suppresses what its siblings produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub response: ResponseDirective,
    pub error: Option<Error>,
}

impl Outcome {
    pub fn into_result(self) -> Result<ResponseDirective> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.response),
        }
    }
}

/// Composite bot: itself a `Handler`, so sets can nest.
pub struct MultiBot {
    handlers: Vec<Arc<dyn Handler>>,
    max_concurrent: usize,
    errors: ErrorReporter,
}

struct Finished {
    name: &'static str,
    reports_errors: bool,
    outcome: Outcome,
}

impl MultiBot {
    pub fn new(
        handlers: Vec<Arc<dyn Handler>>,
        max_concurrent: usize,
        errors: ErrorReporter,
    ) -> Self {
        Self {
            handlers,
            max_concurrent: max_concurrent.max(1),
            errors,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn run(&self, cancel: &CancellationToken, update: Arc<Update>) -> Outcome {
        // Predicates are cheap and run before any task is started.
        let matched: Vec<Arc<dyn Handler>> = self
            .handlers
            .iter()
            .filter(|h| h.has_react(&update))
            .cloned()
            .collect();
        if matched.is_empty() {
            debug!(user_id = update.user.id.0, "no bot reacted");
            return Outcome::default();
        }

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for handler in matched {
            let permits = permits.clone();
            let cancel = cancel.clone();
            let update = update.clone();
            tasks.spawn(async move {
                let outcome = invoke(handler.as_ref(), &permits, &cancel, &update).await;
                Finished {
                    name: handler.name(),
                    reports_errors: handler.reports_errors(),
                    outcome,
                }
            });
        }

        let mut outcome = Outcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Finished {
                    name,
                    reports_errors,
                    outcome: partial,
                }) => {
                    outcome.response.merge(partial.response);
                    let Some(e) = partial.error else {
                        continue;
                    };
                    if e.is_cancelled() {
                        debug!(handler = name, "bot cancelled");
                    } else {
                        debug!(handler = name, error = %e, "bot failed");
                        if !reports_errors {
                            self.errors
                                .report(&e, Some(&format!("bot {name} failed")));
                        }
                    }
                    outcome.error = Some(e);
                }
                Err(join_err) => {
                    let e = Error::External(format!("bot task failed: {join_err}"));
                    self.errors.report(&e, Some("bot task aborted"));
                    outcome.error = Some(e);
                }
            }
        }
        outcome
    }
}

async fn invoke(
    handler: &dyn Handler,
    permits: &Semaphore,
    cancel: &CancellationToken,
    update: &Update,
) -> Outcome {
    let cancelled = || Outcome {
        response: ResponseDirective::default(),
        error: Some(Error::Cancelled),
    };
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return cancelled(),
        permit = permits.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => {
                return Outcome {
                    response: ResponseDirective::default(),
                    error: Some(Error::External("bot permits closed".to_string())),
                }
            }
        },
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => cancelled(),
        outcome = handler.on_message_outcome(cancel, update) => outcome,
    }
}

#[async_trait]
impl Handler for MultiBot {
    fn name(&self) -> &'static str {
        "multi"
    }

    /// Any child reacting is enough, the same rule `run` uses to schedule them.
    fn has_react(&self, update: &Update) -> bool {
        self.handlers.iter().any(|h| h.has_react(update))
    }

    async fn on_message(
        &self,
        cancel: &CancellationToken,
        update: &Update,
    ) -> Result<ResponseDirective> {
        self.run(cancel, Arc::new(update.clone()))
            .await
            .into_result()
    }

    async fn on_message_outcome(&self, cancel: &CancellationToken, update: &Update) -> Outcome {
        self.run(cancel, Arc::new(update.clone())).await
    }

    fn reports_errors(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        error_sink::{self, ErrorSink},
        testing::{text_update, Gauge, ScriptedHandler},
    };

    async fn drained(sink: ErrorSink) -> usize {
        let cancel = CancellationToken::new();
        cancel.cancel();
        sink.run(cancel).await
    }

    #[tokio::test]
    async fn only_reacting_bots_are_invoked() {
        let (errors, _sink) = error_sink::channel();
        let yes = Arc::new(ScriptedHandler::ok("yes", 1));
        let no = Arc::new(ScriptedHandler::ok("no", 1).reacting(false));
        let bots: Vec<Arc<dyn Handler>> = vec![yes.clone(), no.clone()];
        let multi = MultiBot::new(bots, 4, errors);

        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;

        assert!(out.error.is_none());
        assert_eq!(yes.calls(), 1);
        assert_eq!(no.calls(), 0);
        assert_eq!(out.response.actions.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn at_most_four_bots_in_flight() {
        let (errors, _sink) = error_sink::channel();
        let gauge = Arc::new(Gauge::default());
        let bots: Vec<Arc<dyn Handler>> = (0..12)
            .map(|_| {
                Arc::new(
                    ScriptedHandler::ok("slow", 1)
                        .delayed(Duration::from_millis(30))
                        .gauged(gauge.clone()),
                ) as Arc<dyn Handler>
            })
            .collect();
        let multi = MultiBot::new(bots, 4, errors);

        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;

        assert_eq!(out.response.actions.len(), 12);
        assert!(gauge.max() <= 4, "max in flight was {}", gauge.max());
        assert!(gauge.max() >= 2, "bots did not overlap");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_result_is_collected_regardless_of_finish_order() {
        let (errors, _sink) = error_sink::channel();
        let bots: Vec<Arc<dyn Handler>> = (0..7u64)
            .map(|i| {
                Arc::new(
                    ScriptedHandler::ok("varied", 2)
                        .delayed(Duration::from_millis((7 - i) * 5))
                        .sending(i == 3),
                ) as Arc<dyn Handler>
            })
            .collect();
        let multi = MultiBot::new(bots, 4, errors);

        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;

        assert_eq!(out.response.actions.len(), 14);
        assert!(out.response.send);
    }

    #[tokio::test]
    async fn send_flag_stays_false_when_no_bot_sets_it() {
        let (errors, _sink) = error_sink::channel();
        let multi = MultiBot::new(
            vec![
                Arc::new(ScriptedHandler::ok("a", 1).sending(false)),
                Arc::new(ScriptedHandler::ok("b", 0).sending(false)),
            ],
            4,
            errors,
        );
        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;
        assert!(!out.response.send);
        assert_eq!(out.response.actions.len(), 1);
    }

    #[tokio::test]
    async fn failed_sibling_does_not_suppress_success() {
        let (errors, sink) = error_sink::channel();
        let multi = MultiBot::new(
            vec![
                Arc::new(ScriptedHandler::ok("x", 1)),
                Arc::new(ScriptedHandler::failing("y")),
            ],
            4,
            errors,
        );

        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;

        assert!(matches!(&out.error, Some(Error::External(m)) if m == "y failed"));
        assert_eq!(out.response.actions.len(), 1);
        assert!(out.response.send);

        drop(multi);
        assert_eq!(drained(sink).await, 1);
    }

    #[tokio::test]
    async fn cancellation_returns_promptly_and_is_not_reported() {
        let (errors, sink) = error_sink::channel();
        let multi = MultiBot::new(
            vec![Arc::new(
                ScriptedHandler::ok("stuck", 1).delayed(Duration::from_secs(30)),
            )],
            4,
            errors,
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let out = tokio::time::timeout(
            Duration::from_secs(2),
            multi.run(&cancel, Arc::new(text_update(1, "hi"))),
        )
        .await
        .unwrap();

        assert!(matches!(out.error, Some(Error::Cancelled)));
        drop(multi);
        assert_eq!(drained(sink).await, 0);
    }

    #[tokio::test]
    async fn panicking_bot_becomes_an_error() {
        let (errors, sink) = error_sink::channel();
        let multi = MultiBot::new(
            vec![
                Arc::new(ScriptedHandler::panicking("p")),
                Arc::new(ScriptedHandler::ok("fine", 1)),
            ],
            4,
            errors,
        );
        let out = multi
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;
        assert!(matches!(out.error, Some(Error::External(_))));
        assert_eq!(out.response.actions.len(), 1);
        drop(multi);
        assert_eq!(drained(sink).await, 1);
    }

    #[tokio::test]
    async fn nested_set_reacts_if_any_child_does_and_reports_once() {
        let (errors, sink) = error_sink::channel();
        let inner = MultiBot::new(
            vec![
                Arc::new(ScriptedHandler::failing("inner-fail")),
                Arc::new(ScriptedHandler::ok("off", 1).reacting(false)),
            ],
            2,
            errors.clone(),
        );
        let update = text_update(1, "hi");
        assert!(inner.has_react(&update));

        let outer = MultiBot::new(
            vec![Arc::new(inner), Arc::new(ScriptedHandler::ok("outer", 1))],
            4,
            errors,
        );
        let out = outer
            .run(&CancellationToken::new(), Arc::new(update))
            .await;

        assert!(out.error.is_some());
        assert_eq!(out.response.actions.len(), 1);
        drop(outer);
        assert_eq!(drained(sink).await, 1);
    }

    #[tokio::test]
    async fn nested_set_keeps_succeeding_child_output() {
        let (errors, sink) = error_sink::channel();
        let inner = MultiBot::new(
            vec![
                Arc::new(ScriptedHandler::ok("inner-ok", 1)),
                Arc::new(ScriptedHandler::failing("inner-fail")),
            ],
            2,
            errors.clone(),
        );
        let outer = MultiBot::new(vec![Arc::new(inner)], 4, errors);

        let out = outer
            .run(&CancellationToken::new(), Arc::new(text_update(1, "hi")))
            .await;

        assert!(matches!(&out.error, Some(Error::External(m)) if m == "inner-fail failed"));
        assert_eq!(out.response.actions.len(), 1);
        assert!(out.response.send);
        drop(outer);
        assert_eq!(drained(sink).await, 1);
    }

    #[tokio::test]
    async fn empty_set_reacts_to_nothing() {
        let (errors, _sink) = error_sink::channel();
        let multi = MultiBot::new(vec![], 4, errors);
        assert!(multi.is_empty());
        assert!(!multi.has_react(&text_update(1, "hi")));
        let out = multi
            .on_message(&CancellationToken::new(), &text_update(1, "hi"))
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(multi.len(), 0);
    }
}
