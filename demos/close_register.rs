//! Close-register walkthrough against the in-memory gateway

use bigdecimal::BigDecimal;
use caja_core::utils::{format_cop, MemoryGateway};
use caja_core::{
    compute_expected_total, expected_denominations, observability, CashMovement,
    CloseRegisterSession, Denomination, DenominationId, ReconciliationConfig, RegisterStatus,
    SessionState, VarianceClassification,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_pretty();
    println!("💵 Caja Core - Close Register Example\n");

    // 1. Register activity for the shift
    let denominations = vec![
        Denomination::bill(1, 100000),
        Denomination::bill(2, 50000),
        Denomination::bill(3, 20000),
        Denomination::bill(4, 10000),
        Denomination::bill(5, 5000),
        Denomination::bill(6, 2000),
        Denomination::bill(7, 1000),
        Denomination::coin(8, 500),
        Denomination::coin(9, 200),
        Denomination::coin(10, 100),
        Denomination::coin(11, 50),
    ];
    let opening = BigDecimal::from(150000);
    let movements = vec![
        CashMovement::inflow("APERTURA", opening.clone()),
        CashMovement::inflow("VENTA", BigDecimal::from(243700)),
        CashMovement::inflow("VENTA", BigDecimal::from(58000)).to_bank(),
        CashMovement::outflow("GASTO", BigDecimal::from(18500)),
    ];
    let expected_total = compute_expected_total(&opening, &movements);
    let expected_counts = expected_denominations(&expected_total, &denominations);

    println!("📊 Shift summary");
    println!("  Opening:        {}", format_cop(&opening));
    println!("  Expected cash:  {}\n", format_cop(&expected_total));

    let gateway = MemoryGateway::new(
        denominations,
        RegisterStatus::new(expected_total).with_expected_counts(expected_counts),
    );

    // 2. Open the dialog without prefilled counts and count the drawer
    let config = ReconciliationConfig {
        prefill_expected_counts: false,
        ..ReconciliationConfig::default()
    };
    let mut session = CloseRegisterSession::load(&gateway, &config).await?;

    println!("🧮 Counting the drawer...");
    for (id, quantity) in [(1, "3"), (2, "1"), (3, "1"), (4, "2"), (5, "1"), (8, "4")] {
        session.set_count_input(DenominationId(id), quantity)?;
    }

    for denomination in session.denominations() {
        let quantity = session.counts().quantity(denomination.id);
        if quantity > 0 {
            println!(
                "  {:>3} x {:>10} = {}",
                quantity,
                format_cop(&denomination.value),
                format_cop(&denomination.subtotal(quantity))
            );
        }
    }
    println!("  Counted:        {}", format_cop(&session.counted_total()));

    let variance = session.variance();
    let label = match variance.classification {
        VarianceClassification::Surplus => "surplus",
        VarianceClassification::Shortage => "shortage",
        VarianceClassification::Balanced => "balanced",
    };
    println!("  Variance:       {} ({label})\n", format_cop(&variance.amount));

    // 3. A bad split blocks submission until it is corrected
    session.set_cash_on_hand_input("$ 300.000");
    session.set_cash_stored_input("$ 50.000");
    if let SessionState::Invalid(error) = session.state() {
        println!("⚠️  {error}");
    }

    let counted = session.counted_total();
    session.set_cash_on_hand(counted)?;
    session.set_cash_stored(BigDecimal::from(0))?;
    session.set_observations("Sobrante revisado con el supervisor");
    println!("✓ Distribution fixed, state valid: {}\n", session.state().is_valid());

    // 4. Close the register
    let outcome = session.submit(&gateway).await?;
    println!("🔒 Register closed at {}", outcome.closed_at);
    println!("  Declared:       {}", format_cop(&outcome.declared_total));
    println!("  System:         {}", format_cop(&outcome.system_total));
    println!("  Difference:     {}", format_cop(&outcome.variance.amount));

    Ok(())
}
