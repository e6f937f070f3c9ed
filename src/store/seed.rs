use rust_decimal::Decimal;

use crate::models::Account;

/// Fixed demo accounts written on first run. These credentials are test fixtures only.
pub fn demo_accounts() -> Vec<Account> {
    vec![
        Account::new("1", "Omar Sima", "demo@omsin.com", "demo123", "1234567890", Decimal::new(15_750_50, 2), "Savings"),
        Account::new("2", "Fatou Kah", "jane@omsin.com", "fatou123", "0987654321", Decimal::new(8_920_75, 2), "Checking"),
        Account::new("3", "Cheikh Peters", "cheikh@omsin.com", "cheikh123", "0747954315", Decimal::new(2_000_25, 2), "Checking")
    ]
}
