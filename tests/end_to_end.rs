use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use pay_rates::merge::{finalize_dataset, merge_page, merge_with_previous};
use pay_rates::models::{Dataset, StepValue};
use pay_rates::scrapers::parse_page;

const AGREEMENT_URL: &str = "https://www.tbs-sct.canada.ca/agreements-conventions/view-visualiser-eng.aspx?id=1";
const UNREPRESENTED_URL: &str = "https://www.canada.ca/en/treasury-board-secretariat/topics/pay/rates-pay/rates-pay-unrepresented-senior-excluded-employees/excluded.html";

const AGREEMENT_HTML: &str = include_str!("fixtures/agreement.html");
const UNREPRESENTED_HTML: &str = include_str!("fixtures/unrepresented.html");

fn scrape_fixtures() -> Dataset {
    let mut aggregate = Dataset::new();
    merge_page(&mut aggregate, parse_page(AGREEMENT_HTML, AGREEMENT_URL), AGREEMENT_URL);
    merge_page(
        &mut aggregate,
        parse_page(UNREPRESENTED_HTML, UNREPRESENTED_URL),
        UNREPRESENTED_URL,
    );
    finalize_dataset(aggregate)
}

#[test]
fn agreement_page_covers_every_table_shape() {
    let rates = parse_page(AGREEMENT_HTML, AGREEMENT_URL);
    let codes: Vec<&str> = rates.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["AS-01", "EC-02", "PM-01", "PM-02"]);

    // Row mode, dates from legend-labelled first cells.
    let as01 = &rates["AS-01"];
    assert_eq!(as01.len(), 3);
    assert_eq!(as01[2].effective_date.as_deref(), Some("June 21, 2023"));
    assert_eq!(as01[2].amounts().collect::<Vec<_>>(), vec![60076.0, 61807.0, 63610.0]);

    // Legend mode, one record per symbol column.
    let ec02 = &rates["EC-02"];
    let dates: Vec<_> = ec02.iter().map(|r| r.effective_date.clone().unwrap()).collect();
    assert_eq!(dates, vec!["June 21, 2021", "June 21, 2022", "June 21, 2023"]);
    assert_eq!(ec02[1].amounts().collect::<Vec<_>>(), vec![61200.0, 63240.0]);

    // Interleaved codes with a range column.
    let pm01 = &rates["PM-01"][0];
    assert_eq!(pm01.amounts().collect::<Vec<_>>(), vec![50000.0, 55000.0]);
    assert_eq!(pm01.raw_steps.get(&1).map(String::as_str), Some("$50,000 to $55,000"));

    let pm02 = &rates["PM-02"];
    assert_eq!(pm02.len(), 2);
    assert_eq!(pm02[0].amounts().collect::<Vec<_>>(), vec![56000.0, 61000.0]);
    assert_eq!(pm02[1].steps[&1], StepValue::Text("to be determined".to_string()));
}

#[test]
fn unrepresented_page_resolves_ranks_and_drops_unparseable_cells() {
    let rates = parse_page(UNREPRESENTED_HTML, UNREPRESENTED_URL);
    let codes: Vec<&str> = rates.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["AS-01", "CO-RCMP-05", "EX-01"]);

    assert_eq!(rates["AS-01"][1].amounts().collect::<Vec<_>>(), vec![58140.0]);
    assert_eq!(rates["AS-01"][1].steps.len(), 1);
    assert_eq!(
        rates["EX-01"][0].amounts().collect::<Vec<_>>(),
        vec![130000.0, 152900.0]
    );
    assert_eq!(
        rates["CO-RCMP-05"][0].amounts().collect::<Vec<_>>(),
        vec![190000.0, 223500.0]
    );
}

#[test]
fn merged_dataset_serializes_in_canonical_shape() {
    let dataset = scrape_fixtures();
    let text = serde_json::to_string_pretty(&dataset).unwrap();

    let order = ["AS-01", "AS-01-EXCLUDED", "CO-RCMP-05", "EC-02", "EX-01", "PM-01", "PM-02"];
    let positions: Vec<usize> = order
        .iter()
        .map(|code| text.find(&format!("\"{}\":", code)).unwrap())
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value.as_object().unwrap().len(), order.len());
    assert_eq!(
        value["AS-01"]["annual-rates-of-pay"][0],
        json!({
            "effective-date": "June 21, 2021",
            "step-1": 56907,
            "step-2": 58546,
            "step-3": 60254,
            "_source": AGREEMENT_URL,
            "_group": "AS",
            "_level": "01"
        })
    );
    assert_eq!(
        value["AS-01-EXCLUDED"]["annual-rates-of-pay"][0],
        json!({
            "effective-date": "June 22, 2023",
            "step-1": 57000,
            "step-2": 59000,
            "_source": UNREPRESENTED_URL
        })
    );
    assert_eq!(value["PM-01"]["annual-rates-of-pay"][0]["_raw-step-2"], json!("$50,000 to $55,000"));
    assert_eq!(value["PM-02"]["annual-rates-of-pay"][1]["step-1"], json!("to be determined"));
}

#[test]
fn rerun_against_saved_output_is_stable() {
    let first = scrape_fixtures();
    let saved: Dataset = serde_json::from_str(&serde_json::to_string(&first).unwrap()).unwrap();

    let rerun = finalize_dataset(merge_with_previous(saved, scrape_fixtures()));
    assert_eq!(rerun, first);
}
