//! Canned feedback text.
//!
//! Stagnation messages rotate so repeat offenders don't see the same jab
//! twice in a row; the muscle-memory routine is a fixed warmup string that
//! does not depend on any state.

/// Rotating messages shown when performance has flatlined.
pub const STAGNATION_MESSAGES: &[&str] = &[
    "Your WPM has been flat for three sessions. Coasting is not practicing.",
    "Same speed, same accuracy, again. Try actually looking at the drill keys.",
    "A plateau this stable belongs in a geography textbook. Push harder.",
    "No measurable improvement lately. The keyboard is not the problem.",
];

/// Fixed warmup drill cycling through all four rows of the keyboard.
pub const MUSCLE_MEMORY_ROUTINE: &str =
    "fff jjj ddd kkk sss lll aaa ;;; fjdk sla; qqq ppp www ooo zzz mmm qpwo znxm 1234 7890";

/// The stagnation message at `cursor`, wrapping around the list.
pub fn stagnation_message(cursor: usize) -> &'static str {
    STAGNATION_MESSAGES[cursor % STAGNATION_MESSAGES.len()]
}
