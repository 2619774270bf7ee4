use regex::Regex;
use sqlweb::prelude::*;

#[test]
fn markup_is_stored_escaped() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_pairs([("bio", "<b>a&b</b>")], [("quote", "  'x' \"y\"  ")]);
    assert_eq!(req.get("bio", None), Some("&lt;b&gt;a&amp;b&lt;/b&gt;"));
    assert_eq!(req.get("quote", None), Some("&#039;x&#039; &quot;y&quot;"));
    assert!(req.params().iter().all(|p| !p.value.contains('<')));
    Ok(())
}

#[test]
fn origin_restriction_only_matches_the_right_method() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_encoded("id=12", "")?;
    assert_eq!(
        req.lookup("id", Some(Method::Post), FilterKind::Unfiltered, &FilterOptions::default()),
        None
    );
    assert_eq!(
        req.lookup("id", None, FilterKind::Unfiltered, &FilterOptions::default()),
        Some(FilteredValue::Text("12".into()))
    );
    assert_eq!(req.get_int("id", Some(Method::Get)), Some(12));
    Ok(())
}

#[test]
fn get_int_rejects_non_numbers() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_encoded("age=abc", "age=42")?;
    assert_eq!(req.get_int("age", None), None);
    assert_eq!(req.get_int("age", Some(Method::Post)), Some(42));
    Ok(())
}

#[test]
fn get_wins_over_post_for_the_same_name() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_encoded("?page=1", "page=2&page=3")?;
    assert_eq!(req.get("page", None), Some("1"));
    assert_eq!(req.get("page", Some(Method::Post)), Some("3"));
    assert_eq!(req.len(), 2);
    Ok(())
}

#[test]
fn absent_and_invalid_look_the_same() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_encoded("mail=not-an-address", "")?;
    assert_eq!(req.get_email("mail", None), None);
    assert_eq!(req.get_email("other", None), None);
    Ok(())
}

#[test]
fn filters_through_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_encoded(
        "qty=0&ip=192.168.0.10&host=my_host.example&mac=AA-BB-CC-DD-EE-FF&zip=75001",
        "price=12.50&newsletter=off",
    )?;

    let positive = FilterOptions::new().with_range(Some(1.0), None);
    assert_eq!(req.lookup("qty", None, FilterKind::Int, &positive), None);
    assert_eq!(
        req.lookup(
            "qty",
            None,
            FilterKind::Int,
            &positive.with_default(FilteredValue::Int(1))
        ),
        Some(FilteredValue::Int(1))
    );

    assert_eq!(req.get_float("price", Some(Method::Post)), Some(12.5));
    assert_eq!(req.get_bool("newsletter", None), Some(false));
    assert_eq!(req.get_ip("ip", None).as_deref(), Some("192.168.0.10"));
    assert_eq!(
        req.lookup("ip", None, FilterKind::Ip, &FilterOptions::new().public_only()),
        None
    );
    assert_eq!(req.get_domain("host", None).as_deref(), Some("my_host.example"));
    assert_eq!(
        req.lookup("host", None, FilterKind::Domain, &FilterOptions::new().hostname()),
        None
    );
    assert_eq!(req.get_mac("mac", None).as_deref(), Some("AA-BB-CC-DD-EE-FF"));

    let zip = Regex::new(r"^\d{5}$")?;
    assert_eq!(req.get_regexp("zip", None, &zip).as_deref(), Some("75001"));
    assert_eq!(req.get_regexp("mac", None, &zip), None);
    Ok(())
}

#[test]
fn params_serialize_for_debug_output() -> Result<(), Box<dyn std::error::Error>> {
    let req = Request::from_pairs([("a", "1")], [("b", "2")]);
    let json = serde_json::to_value(req.params())?;
    assert_eq!(
        json,
        serde_json::json!([
            {"method": "GET", "name": "a", "value": "1"},
            {"method": "POST", "name": "b", "value": "2"}
        ])
    );
    Ok(())
}
