use once_cell::sync::Lazy;
use regex::Regex;

/// Column holding the applicant's six-digit birthdate code (`YYMMDD`).
pub const BIRTHDATE_FIELD: &str = "생년월일";
/// Column holding the contact phone number.
pub const PHONE_FIELD: &str = "연락처";

const BIRTHDATE_WIDTH: usize = 6;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// Canonicalizes a phone number into dashed form.
///
/// Eleven digits become `DDD-DDDD-DDDD`, ten digits become `DDD-DDD-DDDD`.
/// Anything else (already formatted, too short, not a number) comes back as
/// it was given.
pub fn normalize_phone(value: &str) -> String {
    let digits = NON_DIGIT.replace_all(value, "");
    match digits.len() {
        11 => format!("{}-{}-{}", &digits[0..3], &digits[3..7], &digits[7..11]),
        10 => format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..10]),
        _ => value.to_string(),
    }
}

/// Left-pads a date code with `0` up to six characters.
pub fn normalize_birthdate(value: &str) -> String {
    let len = value.chars().count();
    if len >= BIRTHDATE_WIDTH {
        return value.to_string();
    }
    let mut out = String::with_capacity(BIRTHDATE_WIDTH);
    out.extend(std::iter::repeat('0').take(BIRTHDATE_WIDTH - len));
    out.push_str(value);
    out
}

/// Applies the normalizer registered for `field`, if there is one.
pub fn normalize_field(field: &str, value: &str) -> String {
    match field {
        BIRTHDATE_FIELD => normalize_birthdate(value),
        PHONE_FIELD => normalize_phone(value),
        _ => value.to_string(),
    }
}

/// Rewrites a raw search term so it compares the way stored values of
/// `field` were normalized. Only the birthdate column is affected; a phone
/// term stays as typed so partial numbers still match.
pub fn normalize_term(field: &str, term: &str) -> String {
    if field == BIRTHDATE_FIELD {
        normalize_birthdate(term)
    } else {
        term.to_string()
    }
}
