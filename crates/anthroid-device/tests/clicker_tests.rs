#[cfg(test)]
mod tests {
    use anthroid_config::ClickerConfig;
    use anthroid_device::mock::{MockRunner, MockUiDriver, button, label};
    use anthroid_device::{InstallClicker, UiAutomatorDriver, UiDriver, UiTransport};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_config() -> ClickerConfig {
        ClickerConfig {
            poll_interval_ms: 1,
            settle_ms: 0,
            ..Default::default()
        }
    }

    // ── Single tick ────────────────────────────────────────────

    #[tokio::test]
    async fn test_click_once_clicks_single_match() {
        let driver = Arc::new(MockUiDriver::new(vec![label("应用安装"), button("安装")]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        assert!(clicker.click_once().await);
        assert_eq!(driver.clicked_texts(), vec!["安装"]);
    }

    #[tokio::test]
    async fn test_click_once_prefers_earlier_keyword() {
        let driver = Arc::new(MockUiDriver::new(vec![
            button("Install"),
            button("安装"),
            button("继续安装"),
        ]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        assert!(clicker.click_once().await);
        assert_eq!(driver.clicked_texts(), vec!["继续安装"]);
    }

    #[tokio::test]
    async fn test_click_once_ignores_non_clickable() {
        let driver = Arc::new(MockUiDriver::new(vec![label("安装"), label("OK")]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        assert!(!clicker.click_once().await);
        assert!(driver.clicked_texts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_click_falls_through_to_next_keyword() {
        let driver = Arc::new(
            MockUiDriver::new(vec![button("确定"), button("Install")]).failing_on("确定"),
        );
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        assert!(clicker.click_once().await);
        assert_eq!(driver.clicked_texts(), vec!["Install"]);
    }

    // ── Watch loop ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_watch_stops_at_click_cap() {
        let driver = Arc::new(MockUiDriver::new(vec![button("安装")]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        let report = clicker.watch(Duration::from_secs(120)).await;
        assert_eq!(report.clicks, 10);
        assert!(report.stopped_by_cap);
        assert_eq!(driver.clicked_texts().len(), 10);
    }

    #[tokio::test]
    async fn test_unbounded_timeout_stops_at_click_cap() {
        let driver = Arc::new(MockUiDriver::new(vec![button("安装")]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        let report = clicker.watch(Duration::from_secs(u64::MAX)).await;
        assert_eq!(report.clicks, 10);
        assert!(report.stopped_by_cap);
    }

    #[tokio::test]
    async fn test_watch_follows_dialog_sequence() {
        let driver = Arc::new(
            MockUiDriver::new(vec![label("桌面")])
                .push_screen(vec![button("安装")])
                .push_screen(vec![label("正在安装")])
                .push_screen(vec![button("完成")]),
        );
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        let report = clicker.watch(Duration::from_millis(100)).await;
        assert_eq!(report.clicks, 2);
        assert!(!report.stopped_by_cap);
        assert_eq!(driver.clicked_texts(), vec!["安装", "完成"]);
    }

    #[tokio::test]
    async fn test_watch_times_out_without_matches() {
        let driver = Arc::new(MockUiDriver::new(vec![]));
        let clicker = InstallClicker::new(driver.clone(), &fast_config());

        let report = clicker.watch(Duration::from_millis(30)).await;
        assert_eq!(report.clicks, 0);
        assert!(!report.stopped_by_cap);
    }

    #[tokio::test]
    async fn test_snapshot_errors_are_not_fatal() {
        // Local transport with no dump output: every snapshot fails
        let runner = Arc::new(MockRunner::new());
        let driver = Arc::new(UiAutomatorDriver::new(
            runner.clone(),
            UiTransport::Local,
            "/sdcard/ui.xml",
        ));
        let clicker = InstallClicker::new(driver, &fast_config());

        let report = clicker.watch(Duration::from_millis(20)).await;
        assert_eq!(report.clicks, 0);
        assert!(runner.commands().iter().any(|c| c.contains("uiautomator dump")));
    }

    // ── uiautomator driver ─────────────────────────────────────

    const DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0"><node index="0" text="安装" resource-id="android:id/button1" class="android.widget.Button" clickable="true" bounds="[100,200][300,260]" /></hierarchy>"#;

    #[tokio::test]
    async fn test_uiautomator_driver_local_dump_and_tap() {
        let runner = Arc::new(MockRunner::new().with_stdout("uiautomator dump", DUMP));
        let driver = UiAutomatorDriver::new(runner.clone(), UiTransport::Local, "/sdcard/ui.xml");

        let elements = driver.elements().await.unwrap();
        assert_eq!(elements.len(), 1);
        driver.click(&elements[0]).await.unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "sh -c uiautomator dump /sdcard/ui.xml >/dev/null && cat /sdcard/ui.xml",
                "sh -c input tap 200 230",
            ]
        );
    }

    #[tokio::test]
    async fn test_uiautomator_driver_over_adb() {
        let runner = Arc::new(
            MockRunner::new()
                .with_stdout("getprop ro.product.name", "PGEM10\n")
                .with_stdout("uiautomator dump", DUMP),
        );
        let driver = UiAutomatorDriver::new(
            runner.clone(),
            UiTransport::Adb {
                serial: Some("emulator-5554".into()),
            },
            "/sdcard/ui.xml",
        );

        assert_eq!(driver.device_name().await.unwrap(), "PGEM10");
        let clicker = InstallClicker::new(Arc::new(driver), &fast_config());
        assert!(clicker.click_once().await);

        let invocations = runner.invocations.lock().unwrap().clone();
        assert!(invocations.iter().all(|inv| inv.program == "adb"));
        assert_eq!(invocations[0].args[..3], ["-s", "emulator-5554", "shell"]);
        assert_eq!(invocations.last().unwrap().args[3], "input tap 200 230");
    }
}
