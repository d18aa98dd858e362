//! English number words ("three hundred and twelve point five").
//!
//! Parsing works over pre-split lowercase tokens and consumes the longest
//! prefix that forms a number, so callers can continue with whatever follows.

const UNITS: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [(&str, u64); 8] = [
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const SCALES: [(&str, u64); 4] = [
    ("thousand", 1_000),
    ("million", 1_000_000),
    ("billion", 1_000_000_000),
    ("trillion", 1_000_000_000_000),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Word {
    Unit(u64),
    Ten(u64),
    Hundred,
    Scale(u64),
}

fn classify(token: &str) -> Option<Word> {
    if let Some(value) = UNITS.iter().position(|word| *word == token) {
        return Some(Word::Unit(value as u64));
    }
    if let Some((_, value)) = TENS.iter().find(|(word, _)| *word == token) {
        return Some(Word::Ten(*value));
    }
    if token == "hundred" {
        return Some(Word::Hundred);
    }
    SCALES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, value)| Word::Scale(*value))
}

/// Parse a plain digit literal such as `12`, `3.5` or `1,200`.
pub fn parse_digits(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Split a query into lowercase tokens, breaking hyphenated words
/// ("twenty-one") apart while leaving signed digits alone.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for raw in text.split_whitespace() {
        let lowered = raw.to_lowercase();
        if lowered.contains('-') && lowered.chars().all(|c| c.is_alphabetic() || c == '-') {
            tokens.extend(lowered.split('-').filter(|part| !part.is_empty()).map(str::to_string));
        } else {
            tokens.push(lowered);
        }
    }
    tokens
}

/// Parse the longest number at the start of `tokens`.
///
/// # Arguments
///
/// * `tokens` - lowercase tokens as produced by [`tokenize`]
///
/// # Returns
///
/// The value and the count of tokens consumed, or `None` when the first
/// tokens do not form a number.
pub fn parse_number(tokens: &[String]) -> Option<(f64, usize)> {
    let mut index = 0;
    let mut sign = 1.0;
    if matches!(tokens.first().map(String::as_str), Some("negative" | "minus")) {
        sign = -1.0;
        index = 1;
    }

    let (magnitude, consumed) = parse_magnitude(&tokens[index..])?;
    index += consumed;

    let mut value = magnitude;
    if magnitude.fract() == 0.0 {
        if let Some((digits, consumed)) = parse_decimal_tail(&tokens[index..]) {
            value = format!("{}.{digits}", magnitude as u64).parse().unwrap_or(magnitude);
            index += consumed;
        }
    }

    Some((sign * value, index))
}

fn parse_magnitude(tokens: &[String]) -> Option<(f64, usize)> {
    let first = tokens.first()?;
    if let Some(value) = parse_digits(first) {
        // "5 million"
        if let Some(Word::Scale(scale)) = tokens.get(1).and_then(|token| classify(token)) {
            return Some((value * scale as f64, 2));
        }
        return Some((value, 1));
    }
    parse_word_magnitude(tokens)
}

fn parse_word_magnitude(tokens: &[String]) -> Option<(f64, usize)> {
    let mut total: u64 = 0;
    let mut segment: u64 = 0;
    let mut last: Option<Word> = None;
    let mut last_scale = u64::MAX;
    let mut consumed = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index].as_str();
        if token == "and" {
            let continues = tokens.get(index + 1).and_then(|next| classify(next)).is_some();
            if consumed == 0 || !continues {
                break;
            }
            index += 1;
            continue;
        }

        let Some(word) = classify(token) else {
            break;
        };
        let accepted = match word {
            Word::Unit(0) => consumed == 0,
            Word::Unit(value) => {
                let after_ten = matches!(last, Some(Word::Ten(_))) && value < 10;
                if segment % 100 == 0 && !matches!(last, Some(Word::Unit(_))) || after_ten {
                    segment += value;
                    true
                } else {
                    false
                }
            }
            Word::Ten(value) => {
                if segment % 100 == 0 && !matches!(last, Some(Word::Unit(_) | Word::Ten(_))) {
                    segment += value;
                    true
                } else {
                    false
                }
            }
            Word::Hundred => match last {
                Some(Word::Unit(value)) if (1..10).contains(&value) && segment < 10 => {
                    segment *= 100;
                    true
                }
                None => {
                    segment = 100;
                    true
                }
                _ => false,
            },
            Word::Scale(scale) => {
                if segment > 0 && scale < last_scale {
                    total += segment * scale;
                    segment = 0;
                    last_scale = scale;
                    true
                } else {
                    false
                }
            }
        };
        if !accepted {
            break;
        }
        last = Some(word);
        index += 1;
        consumed = index;
    }

    if consumed == 0 {
        return None;
    }
    Some(((total + segment) as f64, consumed))
}

/// `point five two` after the integer part, as its digit string.
fn parse_decimal_tail(tokens: &[String]) -> Option<(String, usize)> {
    if tokens.first().map(String::as_str) != Some("point") {
        return None;
    }
    let mut digits = String::new();
    let mut index = 1;
    while let Some(token) = tokens.get(index) {
        match classify(token) {
            Some(Word::Unit(value)) if value < 10 => digits.push(char::from(b'0' + value as u8)),
            _ => break,
        }
        index += 1;
    }
    if digits.is_empty() {
        return None;
    }
    Some((digits, index))
}

/// Parse `tokens` as exactly one number.
pub fn parse_exact(tokens: &[String]) -> Option<f64> {
    match parse_number(tokens) {
        Some((value, consumed)) if consumed == tokens.len() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn parses_compound_numbers() {
        assert_eq!(parse_exact(&words("twenty-one")), Some(21.0));
        assert_eq!(parse_exact(&words("three hundred and twelve")), Some(312.0));
        assert_eq!(parse_exact(&words("two thousand five hundred")), Some(2500.0));
        assert_eq!(parse_exact(&words("one million two hundred thousand")), Some(1_200_000.0));
        assert_eq!(parse_exact(&words("hundred")), Some(100.0));
    }

    #[test]
    fn parses_digits_signs_and_decimals() {
        assert_eq!(parse_exact(&words("1,200")), Some(1200.0));
        assert_eq!(parse_exact(&words("5 million")), Some(5_000_000.0));
        assert_eq!(parse_exact(&words("negative seven")), Some(-7.0));
        assert_eq!(parse_exact(&words("three point one four")), Some(3.14));
    }

    #[test]
    fn stops_at_the_first_non_number_word() {
        let tokens = words("eight factorial times two");
        assert_eq!(parse_number(&tokens), Some((8.0, 1)));
        let tokens = words("one hundred and");
        assert_eq!(parse_number(&tokens), Some((100.0, 2)));
    }

    #[test]
    fn rejects_ill_formed_sequences() {
        assert_eq!(parse_number(&words("one two")), Some((1.0, 1)));
        assert_eq!(parse_number(&words("twenty thirty")), Some((20.0, 1)));
        assert_eq!(parse_number(&words("half")), None);
        assert_eq!(parse_number(&words("minus")), None);
    }
}
