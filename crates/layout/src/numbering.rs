use quire_types::blocks::NumberFormat;

/// Formats a display page number.
///
/// Roman and letter formats have no representation for zero; it is rendered
/// in decimal.
pub fn format_page_number(n: u32, format: NumberFormat) -> String {
    if n == 0 {
        return "0".to_string();
    }
    match format {
        NumberFormat::Decimal => n.to_string(),
        NumberFormat::LowerRoman => int_to_lower_roman(n),
        NumberFormat::UpperRoman => int_to_lower_roman(n).to_uppercase(),
        NumberFormat::LowerLetter => int_to_lower_letter(n),
        NumberFormat::UpperLetter => int_to_lower_letter(n).to_uppercase(),
        NumberFormat::NumberInDash => format!("- {} -", n),
    }
}

/// Word-processor letter numbering: the letter repeats once per cycle, so
/// 26 is `z`, 27 is `aa` and 28 is `bb`.
pub fn int_to_lower_letter(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let index = (n - 1) % 26;
    let repeat = (n - 1) / 26 + 1;
    let letter = (b'a' + index as u8) as char;
    std::iter::repeat_n(letter, repeat as usize).collect()
}

pub fn int_to_lower_roman(n: u32) -> String {
    let mut num = n;
    let values = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut result = String::new();
    for &(val, sym) in &values {
        while num >= val {
            result.push_str(sym);
            num -= val;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roman() {
        assert_eq!(format_page_number(4, NumberFormat::LowerRoman), "iv");
        assert_eq!(format_page_number(1994, NumberFormat::UpperRoman), "MCMXCIV");
        assert_eq!(format_page_number(9, NumberFormat::LowerRoman), "ix");
    }

    #[test]
    fn test_letters_repeat() {
        assert_eq!(format_page_number(1, NumberFormat::LowerLetter), "a");
        assert_eq!(format_page_number(26, NumberFormat::LowerLetter), "z");
        assert_eq!(format_page_number(27, NumberFormat::UpperLetter), "AA");
        assert_eq!(format_page_number(28, NumberFormat::UpperLetter), "BB");
        assert_eq!(format_page_number(53, NumberFormat::LowerLetter), "aaa");
    }

    #[test]
    fn test_decimal_and_dash() {
        assert_eq!(format_page_number(12, NumberFormat::Decimal), "12");
        assert_eq!(format_page_number(3, NumberFormat::NumberInDash), "- 3 -");
        assert_eq!(format_page_number(0, NumberFormat::UpperRoman), "0");
    }
}
