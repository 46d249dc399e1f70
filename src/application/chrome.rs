use crate::config::SiteSettings;
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView,
};

/// Builds the page frame (brand, navigation, footer, meta) shared by every
/// public page.
#[derive(Clone)]
pub struct ChromeService {
    chrome: LayoutChrome,
}

impl ChromeService {
    pub fn new(site: &SiteSettings) -> Self {
        let chrome = LayoutChrome {
            brand: BrandView {
                title: site.title.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView {
                entries: vec![
                    NavigationLinkView {
                        label: "Home".to_string(),
                        href: "/".to_string(),
                    },
                    NavigationLinkView {
                        label: "Contacts".to_string(),
                        href: "/contacts".to_string(),
                    },
                ],
            },
            footer: FooterView {
                copy: site.footer_copy.clone(),
            },
            meta: PageMetaView {
                title: site.title.clone(),
                description: site.description.clone(),
                canonical: site.public_url.clone(),
            },
        };

        Self { chrome }
    }

    pub fn public_site_url(&self) -> &str {
        &self.chrome.meta.canonical
    }

    pub fn load(&self) -> LayoutChrome {
        self.chrome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteSettings {
        SiteSettings {
            title: "Field Notes".into(),
            description: "Short essays.".into(),
            footer_copy: "© Field Notes".into(),
            public_url: "https://notes.example.com/".into(),
            timezone: chrono_tz::UTC,
        }
    }

    #[test]
    fn chrome_reflects_site_settings() {
        let chrome = ChromeService::new(&site()).load();

        assert_eq!(chrome.brand.title, "Field Notes");
        assert_eq!(chrome.meta.canonical, "https://notes.example.com/");
        assert_eq!(chrome.footer.copy, "© Field Notes");

        let hrefs: Vec<&str> = chrome
            .navigation
            .entries
            .iter()
            .map(|entry| entry.href.as_str())
            .collect();
        assert_eq!(hrefs, vec!["/", "/contacts"]);
    }
}
