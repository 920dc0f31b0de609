use crate::models::Category;

/// URL fragments that mark a women's or beauty section outright
const WOMENS_URL_PATTERNS: [&str; 9] = [
    "/women", "/womens", "/female", "/ladies",
    "gender=female", "gender=women",
    "/beauty/", "/personal-care/", "/skincare/",
];

const WOMEN_INDICATORS: [&str; 8] = [
    "women's", "womens", "for her", "ladies",
    "feminine", "venus", "skintimate", "secret deodorant",
];

const MEN_INDICATORS: [&str; 4] = ["men's", "mens", "for him", "masculine"];

const CLOTHING_INDICATORS: [&str; 16] = [
    "clothing", "apparel", "fashion", "hoodie", "shirt",
    "t-shirt", "jeans", "pants", "dress", "skirt", "jacket",
    "size chart", "xs", "small", "medium", "large",
];

const PERSONAL_CARE_INDICATORS: [&str; 13] = [
    "razor", "shave", "deodorant", "body wash", "soap",
    "shampoo", "lotion", "cream", "beauty", "skincare",
    "ingredients", "blade", "moisturizer",
];

/// Keyword scores behind a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub url_match: bool,
    pub women_score: usize,
    pub men_score: usize,
    pub clothing_score: usize,
    pub care_score: usize,
}

impl Classification {
    /// Score a page; `url` and `page_text` are lowercased here
    pub fn score(url: &str, page_text: &str) -> Self {
        let url = url.to_lowercase();
        let text = page_text.to_lowercase();

        Self {
            url_match: WOMENS_URL_PATTERNS.iter().any(|p| url.contains(*p)),
            women_score: count_present(&[text.as_str()], &WOMEN_INDICATORS),
            men_score: count_present(&[text.as_str()], &MEN_INDICATORS),
            clothing_score: count_present(&[url.as_str(), text.as_str()], &CLOTHING_INDICATORS),
            care_score: count_present(&[url.as_str(), text.as_str()], &PERSONAL_CARE_INDICATORS),
        }
    }

    /// Ties favour "not women's"
    pub fn is_womens(&self) -> bool {
        self.url_match || self.women_score > self.men_score
    }

    /// Ties favour personal care
    pub fn category(&self) -> Category {
        if self.clothing_score > self.care_score {
            Category::Clothing
        } else {
            Category::PersonalCare
        }
    }
}

/// Number of indicators found in any of the haystacks
fn count_present(haystacks: &[&str], indicators: &[&str]) -> usize {
    indicators
        .iter()
        .filter(|indicator| haystacks.iter().any(|h| h.contains(*indicator)))
        .count()
}

/// Whether the page looks like a women-marketed product page
pub fn is_womens_product(url: &str, page_text: &str) -> bool {
    Classification::score(url, page_text).is_womens()
}

/// Majority class between clothing and personal care
pub fn detect_category(url: &str, page_text: &str) -> Category {
    Classification::score(url, page_text).category()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_URL: &str = "https://www.target.com/p/item/-/A-123";

    #[test]
    fn test_url_pattern_wins() {
        assert!(is_womens_product("https://www.target.com/c/womens-razors", "men's masculine"));
        assert!(is_womens_product("https://www.target.com/beauty/item", ""));
    }

    #[test]
    fn test_women_only_keywords() {
        assert!(is_womens_product(PLAIN_URL, "Venus razor for her"));
    }

    #[test]
    fn test_men_only_keywords() {
        assert!(!is_womens_product(PLAIN_URL, "Razor for him, masculine scent"));
    }

    #[test]
    fn test_tie_is_not_womens() {
        assert!(!is_womens_product(PLAIN_URL, "feminine and masculine"));
        assert!(!is_womens_product(PLAIN_URL, ""));
    }

    #[test]
    fn test_womens_contains_mens_substring() {
        // "women's" also contains "men's": one indicator each side is a tie
        assert!(!is_womens_product(PLAIN_URL, "women's"));
        assert!(is_womens_product(PLAIN_URL, "women's razor, ladies pick"));
    }

    #[test]
    fn test_category_clothing() {
        assert_eq!(detect_category(PLAIN_URL, "Cotton hoodie with size chart"), Category::Clothing);
    }

    #[test]
    fn test_category_personal_care() {
        assert_eq!(detect_category(PLAIN_URL, "Razor with 5 blade cartridge"), Category::PersonalCare);
    }

    #[test]
    fn test_category_tie_is_personal_care() {
        assert_eq!(detect_category(PLAIN_URL, "hoodie razor"), Category::PersonalCare);
        assert_eq!(detect_category(PLAIN_URL, ""), Category::PersonalCare);
    }

    #[test]
    fn test_category_counts_url() {
        assert_eq!(
            detect_category("https://www.target.com/c/clothing/jeans", ""),
            Category::Clothing
        );
    }
}
