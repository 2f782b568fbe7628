/// Folds `A-Z` onto `a-z`, every other byte maps to itself.
static FOLD: [u8; 256] = fold_table();

const fn fold_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).to_ascii_lowercase();
        i += 1;
    }
    table
}

/// Compares two equally long byte slices ignoring ASCII case.
#[inline]
pub(crate) fn eq_ignore_case(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| FOLD[*l as usize] == FOLD[*r as usize])
}
