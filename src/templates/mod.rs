use minijinja::{context, Environment};
use once_cell::sync::Lazy;

use crate::catalog::{excerpt, CatalogEntry, EntryKind};
use crate::errors::WizardError;
use crate::wizard::Styles;

static CONTENT_CARD_TEMPLATE: &str = include_str!("content_card.html");
static PRODUCT_CARD_TEMPLATE: &str = include_str!("product_card.html");

static JINJA_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    if let Err(e) = env.add_template("content_card.html", CONTENT_CARD_TEMPLATE) {
        log::error!("The content card template does not compile: {}", e);
    }
    if let Err(e) = env.add_template("product_card.html", PRODUCT_CARD_TEMPLATE) {
        log::error!("The product card template does not compile: {}", e);
    }
    env
});

/// Five flags, one per star, filled up to the rounded rating. Empty when
/// the entry has no rating.
fn stars(rating: Option<f32>) -> Vec<bool> {
    match rating {
        Some(r) if r > 0.0 => {
            let filled = r.round() as usize;
            (1..=5).map(|i| i <= filled).collect()
        }
        _ => Vec::new(),
    }
}

/// Renders the HTML card for `entry`, honouring the results settings.
pub fn render_card(entry: &CatalogEntry, styles: &Styles) -> Result<String, WizardError> {
    let name = match entry.kind {
        EntryKind::Product => "product_card.html",
        EntryKind::Content => "content_card.html",
    };
    let tmpl = JINJA_ENV
        .get_template(name)
        .map_err(|e| WizardError::Document(format!("card template '{}': {}", name, e)))?;
    tmpl.render(context! {
        entry => entry,
        styles => styles,
        excerpt => excerpt(entry, styles.results_excerpt_length),
        stars => stars(entry.rating),
    })
    .map_err(|e| {
        log::error!("Could not render card {}: {}", entry.id, e);
        WizardError::Document(format!("card {} could not be rendered: {}", entry.id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn catalog() -> Catalog {
        Catalog::parse(
            r#"
entries:
  - id: 1
    title: Trail <Runner>
    url: https://shop.example/trail-runner
    kind: product
    price: "89.00 €"
    rating: 3.6
    image: https://shop.example/trail.jpg
    body: "<p>A light shoe for rough ground.</p>"
  - id: 2
    title: Choosing running shoes
    url: https://blog.example/choosing
    excerpt: How to pick the right pair
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(Some(3.6)), vec![true, true, true, true, false]);
        assert_eq!(stars(Some(0.0)), Vec::<bool>::new());
        assert_eq!(stars(None), Vec::<bool>::new());
    }

    #[test]
    fn test_product_card() {
        let catalog = catalog();
        let html = render_card(catalog.get(1).unwrap(), &Styles::default()).unwrap();
        assert!(html.contains("wf-product-card"));
        assert!(html.contains("Trail &lt;Runner&gt;"));
        assert!(html.contains("89.00 €"));
        assert_eq!(html.matches("wf-star-filled").count(), 4);
        assert_eq!(html.matches("wf-star-empty").count(), 1);
        assert!(html.contains("https://shop.example/trail.jpg"));
    }

    #[test]
    fn test_content_card_honours_settings() {
        let catalog = catalog();
        let entry = catalog.get(2).unwrap();

        let html = render_card(entry, &Styles::default()).unwrap();
        assert!(html.contains("wf-content-card"));
        assert!(html.contains("How to pick the right pair"));
        assert!(html.contains("wf-card-thumbnail-placeholder"));

        let styles = Styles {
            results_show_image: false,
            results_show_excerpt: false,
            results_excerpt_length: 6,
            ..Styles::default()
        };
        let html = render_card(entry, &styles).unwrap();
        assert!(!html.contains("wf-card-thumbnail"));
        assert!(!html.contains("How to"));
        assert!(html.contains("Choosing running shoes"));
    }

    #[test]
    fn test_excerpt_is_truncated_in_card() {
        let catalog = catalog();
        let styles = Styles {
            results_excerpt_length: 6,
            ..Styles::default()
        };
        let html = render_card(catalog.get(2).unwrap(), &styles).unwrap();
        assert!(html.contains("How to..."));
    }
}
