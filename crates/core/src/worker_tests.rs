// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn backoff_grows_and_caps() {
    let policy = ExponentialBackoff::default();
    let d0 = policy.delay_for(0);
    let d5 = policy.delay_for(5);
    let d30 = policy.delay_for(30);
    assert!(d5 >= d0);
    assert!(d30 <= policy.max + Duration::from_millis(1));
}
