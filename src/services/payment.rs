use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw money fields as stored on a booking. `balance_amount` already
/// includes the tip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPayment {
    pub tip_amount: Option<Decimal>,
    pub service_fee: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub balance_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancePaymentType {
    Cash,
    Card,
}

impl BalancePaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalancePaymentType::Cash => "cash",
            BalancePaymentType::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cash" => BalancePaymentType::Cash,
            _ => BalancePaymentType::Card,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub tips: Decimal,
    pub deposit: Decimal,
    pub card_balance: Decimal,
    pub cash_balance: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_fee: Option<Decimal>,
}

/// Splits a booking's money into the lines shown to a viewer.
///
/// With `include_service_fee` the numbers are what the client pays and the
/// fee is its own line. Without it they are the professional's earnings:
/// the fee comes out of the deposit first, then out of the balance.
pub fn calculate_payment_breakdown(
    payment: &BookingPayment,
    include_service_fee: bool,
    balance_payment_type: BalancePaymentType,
) -> PaymentBreakdown {
    let tips = payment.tip_amount.unwrap_or_default().max(Decimal::ZERO);
    let service_fee = payment.service_fee.unwrap_or_default().max(Decimal::ZERO);
    let deposit_amount = payment.deposit_amount.unwrap_or_default();
    let balance_amount = payment.balance_amount.unwrap_or_default();

    let mut deposit = deposit_amount.max(Decimal::ZERO);
    let mut balance = balance_amount.saturating_sub(tips);

    if !include_service_fee {
        let from_deposit = service_fee.min(deposit);
        deposit -= from_deposit;
        balance = balance.saturating_sub(service_fee - from_deposit);
    }
    let balance = balance.max(Decimal::ZERO);

    let total = deposit.saturating_add(balance).saturating_add(tips);

    let (mut card_balance, mut cash_balance) = match balance_payment_type {
        BalancePaymentType::Card => (balance, Decimal::ZERO),
        BalancePaymentType::Cash => (Decimal::ZERO, balance),
    };

    // Cash with no deposit: the fee still has to be charged electronically,
    // out of the balance the client owes.
    if include_service_fee
        && balance_payment_type == BalancePaymentType::Cash
        && deposit_amount.is_zero()
    {
        card_balance = service_fee.min(balance);
        cash_balance = balance - card_balance;
    }

    PaymentBreakdown {
        tips,
        deposit,
        card_balance,
        cash_balance,
        total,
        service_fee: include_service_fee.then_some(service_fee),
    }
}
