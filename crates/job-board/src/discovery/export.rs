use std::io;

use serde::Serialize;

use super::view::OfferView;

#[derive(Serialize)]
struct OfferRow<'a> {
    id: i64,
    title: &'a str,
    organization: &'a str,
    location: &'a str,
    contract_type: &'a str,
    salary: &'a str,
    posted: &'a str,
    closes: &'a str,
}

/// Writes the given offers (already filtered and sorted) as CSV with a header row.
pub fn write_offers_csv<'a, W, I>(writer: W, offers: I) -> Result<(), csv::Error>
where
    W: io::Write,
    I: IntoIterator<Item = &'a OfferView>,
{
    let mut csv = csv::Writer::from_writer(writer);
    for offer in offers {
        csv.serialize(OfferRow {
            id: offer.id,
            title: &offer.title,
            organization: &offer.organization_name,
            location: &offer.location,
            contract_type: &offer.contract_type,
            salary: &offer.salary,
            posted: &offer.posted,
            closes: &offer.closes,
        })?;
    }
    csv.flush()?;
    Ok(())
}
