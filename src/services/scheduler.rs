use std::future::Future;
use std::time::Instant;

use tokio::time::{interval, Duration, MissedTickBehavior};

/// Run `job` every `period`, one cycle at a time. A slow cycle delays the
/// next tick instead of triggering a burst. Failures are logged and the loop
/// waits for the next tick.
pub async fn run_periodic<F, Fut>(name: &'static str, period: Duration, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(job = name, period_secs = period.as_secs(), "Job scheduled");

    loop {
        ticker.tick().await;

        let started = Instant::now();
        if let Err(e) = job().await {
            tracing::error!(job = name, error = %e, "Job cycle failed");
            metrics::counter!("job_failures_total", "job" => name).increment(1);
        }
        metrics::histogram!("job_duration_seconds", "job" => name)
            .record(started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn failing_job_keeps_running() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = tokio::spawn(run_periodic("test", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("upstream down")
            }
        }));

        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.abort();

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
