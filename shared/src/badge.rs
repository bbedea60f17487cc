/// Cosmetic rank label for a point total. Thresholds are checked top-down;
/// the first match wins.
pub const fn badge_for_points(points: u32) -> &'static str {
    match points {
        500.. => "Eco Legend",
        250.. => "Cleanup Captain",
        100.. => "Eco Hero",
        50.. => "Green Champion",
        20.. => "Earth Guardian",
        _ => "Rookie Cleaner",
    }
}
