use itertools::Itertools;
use log::warn;
use mbb_goals_utils::selector;
use scraper::{ElementRef, Html};
use url::Url;

use crate::schema::SeasonGameLink;

/// Collects every "Box score" link of a season index page, in document order.
///
/// Links outside a table row, or in a row with fewer than three cells, are
/// skipped.
pub fn parse_game_links(html: &Html, season_url: &Url) -> Vec<SeasonGameLink> {
    html.select(selector!("a[href]"))
        .filter(|&a| is_box_score_anchor(a))
        .filter_map(|a| parse_row(a, season_url))
        .collect()
}

fn is_box_score_anchor(a: ElementRef) -> bool {
    a.text()
        .map(str::trim)
        .collect::<String>()
        .eq_ignore_ascii_case("box score")
}

fn parse_row(anchor: ElementRef, season_url: &Url) -> Option<SeasonGameLink> {
    let row = anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "tr")?;
    let cells = row.select(selector!("td, th")).map(cell_text).collect_vec();
    let [date_text, location_text, result_text, ..] = &cells[..] else {
        return None;
    };

    let href = anchor.value().attr("href")?;
    let box_url = match season_url.join(href) {
        Ok(url) => url,
        Err(e) => {
            warn!("Ignoring box score link with unusable href {href:?}: {e}");
            return None;
        }
    };

    Some(SeasonGameLink {
        date_text: date_text.clone(),
        location_text: location_text.clone(),
        result_text: result_text.clone(),
        box_url,
    })
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().join(" ").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use scraper::Html;
    use url::Url;

    use super::parse_game_links;

    const SEASON_URL: &str =
        "https://static.cnusports.com/custompages/mbball/Stats/2012-2013/teamstat.htm";

    fn parse(html: &str) -> Vec<super::SeasonGameLink> {
        parse_game_links(
            &Html::parse_document(html),
            &Url::parse(SEASON_URL).unwrap(),
        )
    }

    #[test]
    fn test_rows_in_document_order() {
        let links = parse(
            r#"<html><body><table>
            <tr><th>Date</th><th>Opponent</th><th>Score</th><th></th></tr>
            <tr>
              <td>11/16/12</td><td>at Salisbury</td><td>W 70-65</td>
              <td><a href="cnumgm01.htm">Box score</a></td>
            </tr>
            <tr>
              <td>11/18/12</td><td>vs. <b>Mary Washington</b></td><td>L 60-72 OT</td>
              <td><a href="/other/cnumgm02.htm"> BOX SCORE </a></td>
            </tr>
            </table></body></html>"#,
        );
        assert_eq!(links.len(), 2);

        assert_eq!(links[0].date_text, "11/16/12");
        assert_eq!(links[0].location_text, "at Salisbury");
        assert_eq!(links[0].result_text, "W 70-65");
        assert_eq!(
            links[0].box_url.as_str(),
            "https://static.cnusports.com/custompages/mbball/Stats/2012-2013/cnumgm01.htm"
        );

        assert_eq!(links[1].location_text, "vs.  Mary Washington");
        assert_eq!(links[1].result_text, "L 60-72 OT");
        assert_eq!(
            links[1].box_url.as_str(),
            "https://static.cnusports.com/other/cnumgm02.htm"
        );
    }

    #[test]
    fn test_skipped_links() {
        let links = parse(
            r#"<html><body>
            <p><a href="loose.htm">Box score</a></p>
            <table>
              <tr><td>11/16/12</td><td><a href="short.htm">Box score</a></td></tr>
              <tr><td>11/20/12</td><td>Home</td><td>W 80-50</td><td><a href="recap.htm">Recap</a></td></tr>
              <tr><td>11/21/12</td><td>Home</td><td>W 81-51</td><td><a>Box score</a></td></tr>
              <tr><td>11/22/12</td><td>Home</td><td>W 82-52</td><td><a href="ok.htm">Box score</a></td></tr>
            </table></body></html>"#,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].date_text, "11/22/12");
        assert!(links[0].box_url.as_str().ends_with("/2012-2013/ok.htm"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let row = r#"<tr><td>1/5/13</td><td>Home</td><td>W 1-0</td><td><a href="g.htm">Box score</a></td></tr>"#;
        let links = parse(&format!("<table>{row}{row}</table>"));
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], links[1]);
    }
}
