/// Time-of-day and day-of-week risk multiplier. Weekday numbering is
/// 0 = Monday .. 6 = Sunday. Never clamps; the caller applies
/// `min(1.0, base_risk * m)`.
pub fn adjust_temporal_risk(
    hour: Option<u32>,
    weekday: Option<u32>,
    base_risk: f64,
) -> (f64, Option<String>) {
    let (Some(hour), Some(weekday)) = (hour, weekday) else {
        return (1.0, None);
    };

    let mut multiplier = 1.0;
    let mut reasons: Vec<&str> = Vec::new();

    // Late night (11 PM - 5 AM): fatigue window.
    if hour >= 23 || hour < 5 {
        multiplier += 0.2;
        reasons.push("Unusual late-night activity");
    }

    // Friday 4 PM - 8 PM: CEO-fraud / urgency window.
    if weekday == 4 && (16..=20).contains(&hour) {
        multiplier += 0.15;
        reasons.push("High-risk window for urgency scams (Friday afternoon)");
    }

    // Weekend: reduced ability to verify requests out-of-band.
    if weekday >= 5 {
        multiplier += 0.1;
        if base_risk > 0.4 {
            reasons.push("Weekend targeting detected");
        }
    }

    if multiplier == 1.0 {
        return (1.0, None);
    }

    let explanation = if reasons.is_empty() {
        None
    } else {
        Some(format!("Temporal Warning: {}.", reasons.join("; ")))
    };

    (multiplier, explanation)
}
