// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn fake_clock_sleep_advances_now_without_waiting() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.sleep(Duration::from_secs(30)).await;
    assert_eq!(clock.now(), before + Duration::from_secs(30));
}
