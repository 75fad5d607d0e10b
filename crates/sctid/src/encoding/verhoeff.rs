//! Verhoeff check digit over ASCII decimal strings.

/// Dihedral group D5 multiplication table.
const MULTIPLICATION: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

/// Position-dependent permutation table.
const PERMUTATION: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 7, 6, 8, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const INVERSE: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

/// Folds `digits` right to left, starting at permutation row `offset`.
///
/// `digits` must only contain ASCII decimal digits; callers validate first.
#[inline]
fn fold(digits: &[u8], offset: usize) -> u8 {
    digits
        .iter()
        .rev()
        .enumerate()
        .fold(0_u8, |check, (i, &b)| {
            let digit = usize::from(b - b'0');
            MULTIPLICATION[usize::from(check)][usize::from(PERMUTATION[(i + offset) % 8][digit])]
        })
}

/// Computes the check digit to append to `digits`.
pub fn check_digit(digits: &[u8]) -> u8 {
    INVERSE[usize::from(fold(digits, 1))]
}

/// `true` if the last digit of `digits` is a valid check digit for the rest.
pub fn is_valid(digits: &[u8]) -> bool {
    fold(digits, 0) == 0
}
