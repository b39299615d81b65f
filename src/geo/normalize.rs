//! Geographic identifier normalization.
//!
//! Maps whatever a user typed into a region column ("California", "ca",
//! "06", "Québec", "24") onto the canonical feature key for a geography.
//! The function is total. Unknown subdivision input comes back trimmed and
//! uppercased so it can still be used as a key that simply matches nothing;
//! country-level input is only trimmed and stripped of diacritics.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::Geography;

/// (code, FIPS, full name)
#[rustfmt::skip]
const US_STATES: [(&str, &str, &str); 52] = [
    ("AL", "01", "Alabama"),        ("AK", "02", "Alaska"),
    ("AZ", "04", "Arizona"),        ("AR", "05", "Arkansas"),
    ("CA", "06", "California"),     ("CO", "08", "Colorado"),
    ("CT", "09", "Connecticut"),    ("DE", "10", "Delaware"),
    ("DC", "11", "District of Columbia"),
    ("FL", "12", "Florida"),        ("GA", "13", "Georgia"),
    ("HI", "15", "Hawaii"),         ("ID", "16", "Idaho"),
    ("IL", "17", "Illinois"),       ("IN", "18", "Indiana"),
    ("IA", "19", "Iowa"),           ("KS", "20", "Kansas"),
    ("KY", "21", "Kentucky"),       ("LA", "22", "Louisiana"),
    ("ME", "23", "Maine"),          ("MD", "24", "Maryland"),
    ("MA", "25", "Massachusetts"),  ("MI", "26", "Michigan"),
    ("MN", "27", "Minnesota"),      ("MS", "28", "Mississippi"),
    ("MO", "29", "Missouri"),       ("MT", "30", "Montana"),
    ("NE", "31", "Nebraska"),       ("NV", "32", "Nevada"),
    ("NH", "33", "New Hampshire"),  ("NJ", "34", "New Jersey"),
    ("NM", "35", "New Mexico"),     ("NY", "36", "New York"),
    ("NC", "37", "North Carolina"), ("ND", "38", "North Dakota"),
    ("OH", "39", "Ohio"),           ("OK", "40", "Oklahoma"),
    ("OR", "41", "Oregon"),         ("PA", "42", "Pennsylvania"),
    ("RI", "44", "Rhode Island"),   ("SC", "45", "South Carolina"),
    ("SD", "46", "South Dakota"),   ("TN", "47", "Tennessee"),
    ("TX", "48", "Texas"),          ("UT", "49", "Utah"),
    ("VT", "50", "Vermont"),        ("VA", "51", "Virginia"),
    ("WA", "53", "Washington"),     ("WV", "54", "West Virginia"),
    ("WI", "55", "Wisconsin"),      ("WY", "56", "Wyoming"),
    ("PR", "72", "Puerto Rico"),
];

/// (code, SGC, full name)
#[rustfmt::skip]
const CA_PROVINCES: [(&str, &str, &str); 13] = [
    ("NL", "10", "Newfoundland and Labrador"),
    ("PE", "11", "Prince Edward Island"),
    ("NS", "12", "Nova Scotia"),
    ("NB", "13", "New Brunswick"),
    ("QC", "24", "Quebec"),
    ("ON", "35", "Ontario"),
    ("MB", "46", "Manitoba"),
    ("SK", "47", "Saskatchewan"),
    ("AB", "48", "Alberta"),
    ("BC", "59", "British Columbia"),
    ("YT", "60", "Yukon"),
    ("NT", "61", "Northwest Territories"),
    ("NU", "62", "Nunavut"),
];

/// Alternate spellings seen in upstream boundary data and user sheets
const CA_ALIASES: [(&str, &str); 6] = [
    ("Newfoundland", "NL"),
    ("Yukon Territory", "YT"),
    ("PEI", "PE"),
    ("Nouveau-Brunswick", "NB"),
    ("Nouvelle-Ecosse", "NS"),
    ("Colombie-Britannique", "BC"),
];

fn subdivision_table(geography: Geography) -> Option<&'static [(&'static str, &'static str, &'static str)]> {
    match geography {
        Geography::UsaStates => Some(&US_STATES),
        Geography::CanadaProvinces => Some(&CA_PROVINCES),
        _ => None,
    }
}

/// Remove combining marks after canonical decomposition ("Québec" -> "Quebec")
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalize a raw identifier to the canonical key for `geography`.
pub fn normalize_identifier(raw: &str, geography: Geography) -> String {
    let stripped = strip_diacritics(raw);
    let trimmed = stripped.trim();

    let Some(table) = subdivision_table(geography) else {
        return trimmed.to_string();
    };

    if !trimmed.is_empty() && trimmed.len() <= 2 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        // Numeric sheets often drop the leading zero ("6" for "06")
        let padded = format!("{:0>2}", trimmed);
        if let Some((code, _, _)) = table.iter().find(|(_, num, _)| *num == padded) {
            return (*code).to_string();
        }
    }

    if trimmed.len() == 2 {
        if let Some((code, _, _)) = table.iter().find(|(code, _, _)| code.eq_ignore_ascii_case(trimmed)) {
            return (*code).to_string();
        }
    }

    if let Some((code, _, _)) = table.iter().find(|(_, _, name)| name.eq_ignore_ascii_case(trimmed)) {
        return (*code).to_string();
    }

    if geography == Geography::CanadaProvinces {
        if let Some((_, code)) = CA_ALIASES.iter().find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed)) {
            return (*code).to_string();
        }
    }

    trimmed.to_uppercase()
}

/// Full display name for a canonical subdivision code
pub fn full_name(code: &str, geography: Geography) -> Option<&'static str> {
    subdivision_table(geography)?
        .iter()
        .find(|(c, _, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, _, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_code_and_fips_agree() {
        for (code, fips, name) in US_STATES {
            let g = Geography::UsaStates;
            assert_eq!(normalize_identifier(name, g), code);
            assert_eq!(normalize_identifier(&name.to_uppercase(), g), code);
            assert_eq!(normalize_identifier(code, g), code);
            assert_eq!(normalize_identifier(&code.to_lowercase(), g), code);
            assert_eq!(normalize_identifier(fips, g), code);
        }
        for (code, sgc, name) in CA_PROVINCES {
            let g = Geography::CanadaProvinces;
            assert_eq!(normalize_identifier(name, g), code);
            assert_eq!(normalize_identifier(code, g), code);
            assert_eq!(normalize_identifier(sgc, g), code);
        }
    }

    #[test]
    fn diacritics_are_stripped_first() {
        assert_eq!(normalize_identifier("Québec", Geography::CanadaProvinces), "QC");
        assert_eq!(normalize_identifier("  Nouvelle-Écosse ", Geography::CanadaProvinces), "NS");
        assert_eq!(normalize_identifier("Côte d'Ivoire", Geography::World), "Cote d'Ivoire");
    }

    #[test]
    fn single_digit_fips_is_padded() {
        assert_eq!(normalize_identifier("6", Geography::UsaStates), "CA");
    }

    #[test]
    fn unmatched_is_trimmed_and_uppercased() {
        assert_eq!(normalize_identifier("  Atlantis ", Geography::UsaStates), "ATLANTIS");
        assert_eq!(normalize_identifier("99", Geography::UsaStates), "99");
        assert_eq!(normalize_identifier("", Geography::UsaStates), "");
    }

    #[test]
    fn no_fuzzy_matching() {
        assert_eq!(normalize_identifier("Californa", Geography::UsaStates), "CALIFORNA");
    }

    #[test]
    fn non_subdivision_geographies_keep_case() {
        assert_eq!(normalize_identifier(" France ", Geography::World), "France");
        assert_eq!(normalize_identifier("ca", Geography::UsaNation), "ca");
    }

    #[test]
    fn full_name_lookup() {
        assert_eq!(full_name("tx", Geography::UsaStates), Some("Texas"));
        assert_eq!(full_name("QC", Geography::CanadaProvinces), Some("Quebec"));
        assert_eq!(full_name("QC", Geography::World), None);
    }
}
