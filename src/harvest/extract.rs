// src/harvest/extract.rs
//! Per-layout DOM extraction. Everything here is synchronous: `scraper::Html`
//! is not `Send`, so a page is parsed, walked, and dropped before any await.

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::harvest::types::{RawFields, SourceKind};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css.trim()).map_err(|e| anyhow!("bad selector {css:?}: {e}"))
}

/// Concatenated, trimmed text of every descendant matching `sel`.
fn child_text(el: &ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel)
        .flat_map(|c| c.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Attribute of the first descendant matching `sel`, trimmed.
fn child_attr(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> String {
    el.select(sel)
        .next()
        .and_then(|c| c.value().attr(attr))
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Run `f` over every `item` nested in every `container` match.
fn for_each_item<F>(doc: &Html, container: &str, item: &str, mut f: F) -> Result<Vec<RawFields>>
where
    F: FnMut(&ElementRef<'_>) -> RawFields,
{
    let container = selector(container)?;
    let item = selector(item)?;
    let mut out = Vec::new();
    for c in doc.select(&container) {
        for el in c.select(&item) {
            out.push(f(&el));
        }
    }
    Ok(out)
}

fn ok_foods_link_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"window.open\('(.*?)','_blank'\)").unwrap())
}

impl SourceKind {
    /// Parse `html` and surface one `RawFields` per candidate block.
    ///
    /// Blocks with missing fields are still returned; the required-field check
    /// belongs to [`SourceKind::candidate`].
    pub fn extract(&self, html: &str) -> Result<Vec<RawFields>> {
        let doc = Html::parse_document(html);
        match self {
            SourceKind::SpecialsNamibia { tab_selector } => {
                let anchors = selector("a")?;
                let h3 = selector("h3")?;
                let h4 = selector("h4")?;
                for_each_item(&doc, tab_selector, ".col-lg-6.col-md-6.col-12", |el| {
                    let link = el
                        .select(&anchors)
                        .filter(|a| a.text().collect::<String>().trim() == "Store Info")
                        .filter_map(|a| a.value().attr("href"))
                        .last()
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    RawFields {
                        title: child_text(el, &h3),
                        dates: child_text(el, &h4),
                        link,
                        preview: String::new(),
                    }
                })
            }
            SourceKind::PickNPay => {
                let a = selector("a")?;
                let heading = selector("h2.elementor-heading-title")?;
                let dates = selector("div[data-widget_type='text-editor.default'] > div")?;
                for_each_item(
                    &doc,
                    "div.elementor-posts-container",
                    "article.elementor-post",
                    |el| RawFields {
                        title: child_text(el, &heading),
                        dates: child_text(el, &dates),
                        link: child_attr(el, &a, "href"),
                        preview: String::new(),
                    },
                )
            }
            SourceKind::Shoprite => {
                let button = selector("button.cmp-leaflets-specials__leaflets__item__catalogue")?;
                let validity = selector("p.cmp-leaflets-specials__leaflets__item__validity")?;
                let image = selector("img.cmp-leaflets-specials__leaflets__item__image")?;
                for_each_item(&doc, "div.cmp-leaflets-specials__leaflets", "div", |el| {
                    RawFields {
                        title: String::new(),
                        dates: child_text(el, &validity),
                        link: child_attr(el, &button, "data-leaflet-external-url"),
                        preview: child_attr(el, &image, "src"),
                    }
                })
            }
            SourceKind::SparMaerua => {
                let a = selector("a")?;
                for_each_item(&doc, "ul.dropdown-menu", "li", |el| RawFields {
                    title: String::new(),
                    dates: child_text(el, &a),
                    link: child_attr(el, &a, "href"),
                    preview: String::new(),
                })
            }
            SourceKind::Checkers => {
                let a = selector("a")?;
                for_each_item(
                    &doc,
                    "div.aem-Grid.aem-Grid--12.aem-Grid--default--12.aem-Grid--phone--12",
                    "div.responsivegrid.aem-GridColumn--default--none.aem-GridColumn--phone--none\
                     .aem-GridColumn--phone--12.aem-GridColumn.aem-GridColumn--offset--phone--0\
                     .aem-GridColumn--offset--default--1.aem-GridColumn--default--2",
                    |el| RawFields {
                        link: child_attr(el, &a, "href"),
                        ..RawFields::default()
                    },
                )
            }
            SourceKind::OkFoods { base_url } => {
                let button = selector("button.viewButton.cmp-button")?;
                let re = ok_foods_link_re();
                for_each_item(
                    &doc,
                    "ul.search_results__content.search_results__multi",
                    "div.specials-actions-cell",
                    |el| {
                        let onclick = child_attr(el, &button, "onclick");
                        let link = re
                            .captures(&onclick)
                            .and_then(|c| c.get(1))
                            .map(|m| format!("{base_url}{}", m.as_str()))
                            .unwrap_or_default();
                        RawFields {
                            link,
                            ..RawFields::default()
                        }
                    },
                )
            }
        }
    }
}
