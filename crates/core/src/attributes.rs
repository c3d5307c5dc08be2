//! Closed performer attribute enums.

string_enum! {
    Gender {
        Male => "MALE",
        Female => "FEMALE",
        TransgenderMale => "TRANSGENDER_MALE",
        TransgenderFemale => "TRANSGENDER_FEMALE",
        Intersex => "INTERSEX",
        NonBinary => "NON_BINARY",
    }
}

string_enum! {
    Ethnicity {
        Caucasian => "CAUCASIAN",
        Black => "BLACK",
        Asian => "ASIAN",
        Indian => "INDIAN",
        Latin => "LATIN",
        MiddleEastern => "MIDDLE_EASTERN",
        Mixed => "MIXED",
        Other => "OTHER",
    }
}

string_enum! {
    EyeColor {
        Blue => "BLUE",
        Brown => "BROWN",
        Grey => "GREY",
        Green => "GREEN",
        Hazel => "HAZEL",
        Red => "RED",
    }
}

string_enum! {
    HairColor {
        Blonde => "BLONDE",
        Brunette => "BRUNETTE",
        Black => "BLACK",
        Red => "RED",
        Auburn => "AUBURN",
        Grey => "GREY",
        Bald => "BALD",
        Various => "VARIOUS",
        Other => "OTHER",
    }
}

string_enum! {
    BreastType {
        Natural => "NATURAL",
        Fake => "FAKE",
        /// Not applicable.
        Na => "NA",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for gender in Gender::ALL {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), *gender);
        }
    }

    #[test]
    fn parse_rejects_unknown_value() {
        assert!("PURPLE".parse::<EyeColor>().is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let json = serde_json::to_string(&HairColor::Auburn).unwrap();
        assert_eq!(json, "\"AUBURN\"");
    }
}
