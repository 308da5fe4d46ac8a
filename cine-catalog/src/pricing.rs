use crate::seatmap::SeatCategory;

/// Ticket prices in VND, the smallest unit used by the system.
pub const STANDARD_PRICE: i32 = 75_000;
pub const VIP_PRICE: i32 = 110_000;
pub const COUPLE_PRICE: i32 = 250_000;

/// Price of a single seat by category. Pure and deterministic.
pub fn seat_price(category: SeatCategory) -> i32 {
    match category {
        SeatCategory::Standard => STANDARD_PRICE,
        SeatCategory::Vip => VIP_PRICE,
        SeatCategory::Couple => COUPLE_PRICE,
    }
}

/// Flat per-ticket price for capacity-count showtimes.
pub fn ticket_price() -> i32 {
    STANDARD_PRICE
}
