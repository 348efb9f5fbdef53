//! A hand-instrumented observable account.
//!
//! Every setter routes its write through an [`Interceptor`], the same way
//! generated setters do. Writes without an explicit interceptor use
//! [`Interceptor::global`].
//!
//! | Property | Field kind | Readable |
//! |----------|------------|----------|
//! | `balance` | scalar | yes |
//! | `owner` | scalar (field `owner_name`) | yes |
//! | `memo` | scalar | no |
//! | `history` | list | yes |
//! | `limits` | map | yes |
//!
//! # Example
//!
//! ```
//! use beanwatch_core::Observable;
//! use beanwatch_test::account::Account;
//!
//! let mut account = Account::new("ada", 100);
//! account.set_balance(150);
//! assert_eq!(account.balance(), 150);
//! assert_eq!(account.read_property("balance"), Some(150.into()));
//! ```

use std::collections::BTreeMap;

use beanwatch_core::{Observable, PropertyChangeSupport, PropertyValue, ToPropertyValue};
use beanwatch_intercept::{
    FieldDescriptor, Interceptor, MemberDescriptor, TypeDescriptor, WriteOutcome, WriteSite,
};

const ACCOUNT: TypeDescriptor = TypeDescriptor::observable("Account");

const BALANCE: FieldDescriptor = FieldDescriptor::scalar("balance");
const OWNER: FieldDescriptor = FieldDescriptor::scalar("owner_name").with_property("owner");
const MEMO: FieldDescriptor = FieldDescriptor::scalar("memo");
const HISTORY: FieldDescriptor = FieldDescriptor::list("history");
const LIMITS: FieldDescriptor = FieldDescriptor::map("limits");

/// Write sites of [`Account`], public so tests can drive them directly.
pub mod sites {
    use super::*;

    pub static SET_BALANCE: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("set_balance"), BALANCE);
    pub static DEPOSIT: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("deposit"), BALANCE);
    pub static GET_BALANCE: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("get_balance_or_reset"), BALANCE);
    pub static RESET_QUIETLY: WriteSite = WriteSite::new(
        ACCOUNT,
        MemberDescriptor::method("reset_quietly").opted_out(),
        BALANCE,
    );
    pub static SET_OWNER: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("set_owner"), OWNER);
    pub static SET_MEMO: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("set_memo"), MEMO);
    pub static SET_HISTORY: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("set_history"), HISTORY);
    pub static SET_LIMITS: WriteSite =
        WriteSite::new(ACCOUNT, MemberDescriptor::method("set_limits"), LIMITS);
}

/// Observable account fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    support: PropertyChangeSupport,
    balance: i64,
    owner_name: String,
    memo: String,
    history: Vec<i64>,
    limits: BTreeMap<String, i64>,
}

impl Account {
    /// Constructor writes are initialisation and announce nothing.
    pub fn new(owner: impl Into<String>, balance: i64) -> Self {
        Self {
            support: PropertyChangeSupport::new("Account"),
            balance,
            owner_name: owner.into(),
            memo: String::new(),
            history: Vec::new(),
            limits: BTreeMap::new(),
        }
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn owner(&self) -> &str {
        &self.owner_name
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn history(&self) -> &[i64] {
        &self.history
    }

    pub fn limits(&self) -> &BTreeMap<String, i64> {
        &self.limits
    }

    pub fn set_balance(&mut self, balance: i64) -> WriteOutcome {
        self.set_balance_with(Interceptor::global(), balance)
    }

    pub fn set_balance_with(&mut self, interceptor: &Interceptor, balance: i64) -> WriteOutcome {
        interceptor.write_property(self, &sites::SET_BALANCE, |a| &mut a.balance, balance)
    }

    /// Adds `amount` to the balance, written from a member named `deposit`.
    pub fn deposit_with(&mut self, interceptor: &Interceptor, amount: i64) -> WriteOutcome {
        let balance = self.balance + amount;
        interceptor.write_property(self, &sites::DEPOSIT, |a| &mut a.balance, balance)
    }

    /// Lazy reset from a getter-named member; never announced.
    pub fn get_balance_or_reset_with(&mut self, interceptor: &Interceptor) -> i64 {
        if self.balance < 0 {
            interceptor.write_property(self, &sites::GET_BALANCE, |a| &mut a.balance, 0);
        }
        self.balance
    }

    /// Opted-out member; never announced.
    pub fn reset_quietly_with(&mut self, interceptor: &Interceptor) -> WriteOutcome {
        interceptor.write_property(self, &sites::RESET_QUIETLY, |a| &mut a.balance, 0)
    }

    pub fn set_owner(&mut self, owner: impl Into<String>) -> WriteOutcome {
        self.set_owner_with(Interceptor::global(), owner)
    }

    pub fn set_owner_with(&mut self, interceptor: &Interceptor, owner: impl Into<String>) -> WriteOutcome {
        interceptor.write_property(self, &sites::SET_OWNER, |a| &mut a.owner_name, owner.into())
    }

    pub fn set_memo_with(&mut self, interceptor: &Interceptor, memo: impl Into<String>) -> WriteOutcome {
        interceptor.write_property(self, &sites::SET_MEMO, |a| &mut a.memo, memo.into())
    }

    pub fn set_history_with(&mut self, interceptor: &Interceptor, history: Vec<i64>) -> WriteOutcome {
        interceptor.write_property(self, &sites::SET_HISTORY, |a| &mut a.history, history)
    }

    pub fn set_limits_with(
        &mut self,
        interceptor: &Interceptor,
        limits: BTreeMap<String, i64>,
    ) -> WriteOutcome {
        interceptor.write_property(self, &sites::SET_LIMITS, |a| &mut a.limits, limits)
    }
}

impl Observable for Account {
    fn change_support(&self) -> &PropertyChangeSupport {
        &self.support
    }

    // `memo` has no accessor.
    fn read_property(&self, property_name: &str) -> Option<PropertyValue> {
        match property_name {
            "balance" => Some(self.balance.to_property_value()),
            "owner" => Some(self.owner_name.to_property_value()),
            "history" => Some(self.history.to_property_value()),
            "limits" => Some(self.limits.to_property_value()),
            _ => None,
        }
    }
}
