mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use deal_load::{import_deals, install, DealScript, PayloadConfig};
    use deal_load::import::{STATUS_CHECK, SUCCESS_COUNT_CHECK};
    use fxload::prelude::*;
    use std::time::Duration;

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ntest::timeout(20_000)]
    async fn short_staged_run_passes_checks() {
        let url = init();

        let payload = PayloadConfig {
            id_prefix: "staged".to_string(),
            ..Default::default()
        };
        let script = DealScript::new(
            url,
            payload,
            Duration::from_millis(100),
            Duration::from_secs(5),
        )
        .unwrap();
        install(script).unwrap();

        let stats = import_deals()
            .start_vus(0)
            .stage(Duration::from_millis(500), 4)
            .stage(Duration::from_secs(1), 4)
            .stage(Duration::from_millis(300), 0)
            .graceful_stop(Duration::from_secs(5))
            .await;

        assert_eq!(stats.max_vus, 4);
        assert!(stats.iterations > 10, "iterations: {}", stats.iterations);
        assert_eq!(stats.interrupted_iterations, 0);
        assert_eq!(stats.error_rate, 0.);
        assert!(stats.checks_passed(), "{stats}");

        let status = stats.check(STATUS_CHECK).unwrap();
        assert_eq!(status.passes, stats.iterations);
        assert_eq!(stats.check(SUCCESS_COUNT_CHECK).unwrap().fails, 0);

        assert!(logs_contain("Scenario complete"));
    }
}
