// tests/harvest_extract.rs
mod common;

use common::{fixture, groceries_tab};
use specials_harvester::harvest::types::Candidate;
use specials_harvester::SourceKind;

fn candidates(kind: &SourceKind, page: &str) -> (usize, Vec<Candidate>) {
    let raws = kind.extract(&fixture(page)).expect("extract");
    let n = raws.len();
    let out = raws
        .into_iter()
        .filter_map(|r| kind.candidate(r, "Groceries"))
        .collect();
    (n, out)
}

#[test]
fn specials_namibia_reads_only_the_configured_tab() {
    let (raw, c) = candidates(&groceries_tab(), "specials_namibia.html");
    assert_eq!(raw, 3);
    assert_eq!(c.len(), 2, "block without dates is skipped");

    assert_eq!(c[0].title, "Milk 2L Special");
    assert_eq!(c[0].fingerprint, "Milk 2L Special01-07 Jan");
    // anchor text is compared after trimming; "Store Info Hours" is not a match
    assert_eq!(c[0].source_url, "https://x/a", "takes the Store Info link");

    assert_eq!(c[1].fingerprint, "Rice 10kg03-10 Jan");
    assert!(c[1].source_url.is_empty());

    let hardware = SourceKind::SpecialsNamibia {
        tab_selector: "#nav-hardware".into(),
    };
    let (_, c) = candidates(&hardware, "specials_namibia.html");
    assert_eq!(c.len(), 1);
    assert_eq!(c[0].title, "Drill Deal");
}

#[test]
fn pick_n_pay_posts_link_leaflets() {
    let (raw, c) = candidates(&SourceKind::PickNPay, "pick_n_pay.html");
    assert_eq!(raw, 3);
    assert_eq!(c.len(), 2);
    assert_eq!(c[0].fingerprint, "Weekly Specials Valid 01 - 07 January");
    assert_eq!(
        c[0].document_link.as_deref(),
        Some("https://pnp.na/wp-content/uploads/weekly.pdf")
    );
}

#[test]
fn shoprite_nested_blocks_share_a_fingerprint() {
    let (raw, c) = candidates(&SourceKind::Shoprite, "shoprite.html");
    // outer item, its inner div, second item, spacer
    assert_eq!(raw, 4);
    assert_eq!(c.len(), 3);
    assert_eq!(c[0].fingerprint, c[1].fingerprint);
    assert_eq!(
        c[0].fingerprint,
        "Shoprite Specials  Valid 02 Jan - 14 Jan https://shoprite/img/jan.jpg"
    );
    assert_eq!(c[0].source_url, "https://leaflets/shoprite-jan");
    assert_eq!(c[2].title, "Shoprite Specials ");
}

#[test]
fn spar_checkers_and_ok_foods() {
    let (_, spar) = candidates(&SourceKind::SparMaerua, "spar_maerua.html");
    assert_eq!(spar.len(), 2);
    assert_eq!(
        spar[1].fingerprint,
        "Spar Marua  January Week 2 https://spar/leaflets/jan-week2.pdf"
    );

    let (raw, checkers) = candidates(&SourceKind::Checkers, "checkers.html");
    assert_eq!(raw, 2);
    assert_eq!(checkers.len(), 1);
    assert_eq!(checkers[0].fingerprint, "Checkers /promotions/summer-savings.html");

    let ok = SourceKind::OkFoods {
        base_url: "https://www.okfoods.co.za".into(),
    };
    let (raw, c) = candidates(&ok, "ok_foods.html");
    assert_eq!(raw, 2);
    assert_eq!(c.len(), 1);
    let url = "https://www.okfoods.co.za/content/dam/okfoods/na/leaflet-jan.pdf";
    assert_eq!(c[0].source_url, url);
    assert_eq!(c[0].document_link.as_deref(), Some(url));
    assert_eq!(c[0].fingerprint, format!("OK Foods{url}"));
}

#[test]
fn unrelated_page_yields_nothing() {
    let (raw, c) = candidates(&SourceKind::PickNPay, "checkers.html");
    assert_eq!(raw, 0);
    assert!(c.is_empty());
}
