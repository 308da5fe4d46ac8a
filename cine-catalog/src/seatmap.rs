use serde::{Deserialize, Serialize};

/// Seat categories on the standard auditorium layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatCategory {
    Standard,
    Vip,
    Couple,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub id: String,
    pub category: SeatCategory,
}

const ROWS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
const COLS: u32 = 12;

/// The standard 96-seat auditorium: rows A-H, 12 columns. Rows G and H are
/// VIP, with the middle of H (H5-H8) sold as couple seats.
pub fn standard_seat_map() -> Vec<Seat> {
    let mut seats = Vec::with_capacity(ROWS.len() * COLS as usize);
    for row in ROWS {
        for col in 1..=COLS {
            let id = format!("{}{}", row, col);
            // category_of is total over the generated range
            let category = category_of(&id).unwrap_or(SeatCategory::Standard);
            seats.push(Seat { id, category });
        }
    }
    seats
}

/// Derive the category of a seat id, or None if the id is not part of the
/// standard layout.
pub fn category_of(seat_id: &str) -> Option<SeatCategory> {
    let mut chars = seat_id.chars();
    let row = chars.next()?;
    if !ROWS.contains(&row) {
        return None;
    }

    let col: u32 = chars.as_str().parse().ok()?;
    if col < 1 || col > COLS {
        return None;
    }

    if row == 'H' && (5..=8).contains(&col) {
        return Some(SeatCategory::Couple);
    }
    if row == 'G' || row == 'H' {
        return Some(SeatCategory::Vip);
    }
    Some(SeatCategory::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_size_and_categories() {
        let seats = standard_seat_map();
        assert_eq!(seats.len(), 96);

        let vip = seats
            .iter()
            .filter(|s| s.category == SeatCategory::Vip)
            .count();
        let couple = seats
            .iter()
            .filter(|s| s.category == SeatCategory::Couple)
            .count();

        // Rows G and H minus the four couple seats
        assert_eq!(vip, 20);
        assert_eq!(couple, 4);
    }

    #[test]
    fn test_category_of() {
        assert_eq!(category_of("A1"), Some(SeatCategory::Standard));
        assert_eq!(category_of("G12"), Some(SeatCategory::Vip));
        assert_eq!(category_of("H5"), Some(SeatCategory::Couple));
        assert_eq!(category_of("H4"), Some(SeatCategory::Vip));
        assert_eq!(category_of("H9"), Some(SeatCategory::Vip));
    }

    #[test]
    fn test_rejects_ids_outside_layout() {
        assert_eq!(category_of("Z1"), None);
        assert_eq!(category_of("A13"), None);
        assert_eq!(category_of("A0"), None);
        assert_eq!(category_of(""), None);
        assert_eq!(category_of("A"), None);
    }
}
