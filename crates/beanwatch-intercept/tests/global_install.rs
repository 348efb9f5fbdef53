//! Process-wide interceptor installation.
//!
//! Kept in its own test binary: installation is once per process.

use beanwatch_config::{CollectionPolicyConfig, ObservingConfig};
use beanwatch_core::{CollectionPolicy, Observable};
use beanwatch_intercept::{Interceptor, RuleError};
use beanwatch_test::{Account, CountingListener};

#[test]
fn install_once_then_reject() {
    let malformed = ObservingConfig::new().exclude_field("balance");
    assert!(matches!(
        Interceptor::install(&malformed),
        Err(RuleError::Config(_))
    ));

    let config = ObservingConfig::new().with_collection_policy(CollectionPolicyConfig::NotifyOnChange);
    let installed = Interceptor::install(&config).unwrap();
    assert_eq!(installed.collection_policy(), CollectionPolicy::NotifyOnChange);
    assert!(std::ptr::eq(installed, Interceptor::global()));

    assert!(matches!(
        Interceptor::install(&ObservingConfig::default()),
        Err(RuleError::AlreadyInstalled)
    ));

    let mut account = Account::new("ada", 1);
    let (counter, handle) = CountingListener::shared();
    account.add_listener(handle);
    account.set_balance(2);
    account.set_owner("grace");
    assert_eq!(counter.count(), 2);
}
