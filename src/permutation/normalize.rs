use phf::phf_map;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Letters that NFD leaves alone but that have a conventional ASCII spelling
/// in mailbox names.
const FOLD_MAP: phf::Map<char, &'static str> = phf_map! {
    'ß' => "ss",
    'æ' => "ae", 'Æ' => "ae",
    'œ' => "oe", 'Œ' => "oe",
    'ø' => "o", 'Ø' => "o",
    'ł' => "l", 'Ł' => "l",
    'đ' => "d", 'Đ' => "d",
    'ð' => "d", 'Ð' => "d",
    'þ' => "th", 'Þ' => "th",
    'ı' => "i",
};

/// Folds a personal name into lowercase ASCII tokens.
///
/// Diacritics are dropped, anything that is neither alphanumeric nor
/// whitespace disappears (so `Jean-Pierre` becomes `jeanpierre`), and runs of
/// whitespace separate tokens.
pub(crate) fn name_tokens(input: &str) -> Vec<String> {
    let mut folded = String::with_capacity(input.len());
    for c in input.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if let Some(replacement) = FOLD_MAP.get(&c) {
            folded.push_str(replacement);
        } else if c.is_ascii_alphanumeric() {
            folded.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() {
            folded.push(' ');
        }
    }
    folded.split_whitespace().map(str::to_string).collect()
}
