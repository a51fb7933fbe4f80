#[macro_export]
macro_rules! selector {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::scraper::Selector;
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($e).unwrap());
        &*SELECTOR
    }};
}

#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::regex::Regex;
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new($e).unwrap());
        &*PATTERN
    }};
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    #[test]
    fn test_macros() {
        assert!(regex!(r"^\d+-\d+$").is_match("22-5"));
        assert!(!regex!(r"^\d+-\d+$").is_match("Newport"));

        let html = Html::parse_fragment("<table><tr><td>x</td><td>y</td></tr></table>");
        assert_eq!(html.select(selector!("td")).count(), 2);
    }
}
