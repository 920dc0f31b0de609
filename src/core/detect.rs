use crate::models::{Retailer, WidgetSite};

/// Hostname fragments checked in order; the first hit wins.
const RETAILER_HOSTS: [(&str, Retailer); 6] = [
    ("target.com", Retailer::Target),
    ("uniqlo.com", Retailer::Uniqlo),
    ("hm.com", Retailer::Hm),
    ("zara.com", Retailer::Zara),
    ("ae.com", Retailer::Ae),
    ("walmart.com", Retailer::Walmart),
];

/// Map a page hostname to a supported retailer
///
/// Substring match against the lowercased hostname, so subdomains such as
/// `www2.hm.com` resolve too. Returns `None` for unsupported sites.
pub fn detect_site(hostname: &str) -> Option<Retailer> {
    let host = hostname.to_lowercase();

    RETAILER_HOSTS
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
        .map(|(_, retailer)| *retailer)
}

/// Map a hostname to a widget site (exact host match only)
pub fn widget_site(hostname: &str) -> Option<WidgetSite> {
    match hostname.to_lowercase().as_str() {
        "www.ae.com" => Some(WidgetSite::AmericanEagle),
        "www.zara.com" => Some(WidgetSite::Zara),
        "www2.hm.com" => Some(WidgetSite::Hm),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_hosts() {
        assert_eq!(detect_site("www.target.com"), Some(Retailer::Target));
        assert_eq!(detect_site("www.uniqlo.com"), Some(Retailer::Uniqlo));
        assert_eq!(detect_site("www2.hm.com"), Some(Retailer::Hm));
        assert_eq!(detect_site("www.zara.com"), Some(Retailer::Zara));
        assert_eq!(detect_site("www.ae.com"), Some(Retailer::Ae));
        assert_eq!(detect_site("www.walmart.com"), Some(Retailer::Walmart));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_site("WWW.TARGET.COM"), Some(Retailer::Target));
    }

    #[test]
    fn test_unsupported_hosts() {
        assert_eq!(detect_site("example.org"), None);
        assert_eq!(detect_site(""), None);
    }

    #[test]
    fn test_widget_site_exact_only() {
        assert_eq!(widget_site("www.ae.com"), Some(WidgetSite::AmericanEagle));
        assert_eq!(widget_site("www2.hm.com"), Some(WidgetSite::Hm));
        assert_eq!(widget_site("www.zara.com"), Some(WidgetSite::Zara));
        assert_eq!(widget_site("ae.com"), None);
        assert_eq!(widget_site("www.hm.com"), None);
    }
}
