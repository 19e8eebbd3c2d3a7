use super::*;

#[test]
fn defaults_to_variant_flavor() {
    let cli = Cli::try_parse_from(["storecat"]).expect("expected valid cli args");
    assert_eq!(cli.flavor, Flavor::Variants);
    assert!(cli.output.is_none());
    assert!(cli.max_pages.is_none());
}

#[test]
fn parses_cards_flavor_and_overrides() {
    let cli = Cli::try_parse_from([
        "storecat",
        "--flavor",
        "cards",
        "--output",
        "out/cards.csv",
        "--max-pages",
        "3",
    ])
    .expect("expected valid cli args");

    assert_eq!(cli.flavor, Flavor::Cards);
    assert_eq!(cli.output, Some(PathBuf::from("out/cards.csv")));
    assert_eq!(cli.max_pages, Some(3));
}

#[test]
fn short_output_flag() {
    let cli = Cli::try_parse_from(["storecat", "-o", "x.csv"]).expect("expected valid cli args");
    assert_eq!(cli.output, Some(PathBuf::from("x.csv")));
}

#[test]
fn rejects_unknown_flavor() {
    assert!(Cli::try_parse_from(["storecat", "--flavor", "json"]).is_err());
}

#[test]
fn fatal_outcome_writes_header_only_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("productos.csv");
    let outcome: Result<CatalogRun<VariantRecord>, CatalogError> =
        Err(CatalogError::FirstPageUnavailable {
            url: "https://shop.example/productos?page=1".to_owned(),
            source: storecat_scraper::ScraperError::NotFound {
                url: "https://shop.example/productos?page=1".to_owned(),
            },
        });

    let result = finish(outcome, &path, &VariantRecord::HEADERS);

    assert!(result.is_err());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "name,sku,color,price,link\n"
    );
}

#[test]
fn successful_outcome_writes_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.csv");
    let run = CatalogRun {
        records: vec![ProductCard {
            name: "Termo".to_owned(),
            price: 2500.0,
            link: storecat_core::ProductUrl::new("https://shop.example/productos/termo/"),
            image: String::new(),
        }],
        summary: RunSummary::default(),
    };

    finish(Ok(run), &path, &ProductCard::HEADERS).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "name,price,link,image\nTermo,2500.0,https://shop.example/productos/termo/,\n"
    );
}

fn offline_config(output_path: PathBuf) -> AppConfig {
    AppConfig {
        base_url: "https://shop.example/productos".to_owned(),
        page_param: "page".to_owned(),
        listing_link_selector: "a.item-link".to_owned(),
        product_name_selector: "meta[name='twitter:title']".to_owned(),
        detail_ready_selector: "script".to_owned(),
        variants_marker: "LS.variants".to_owned(),
        card_selector: ".js-item-product".to_owned(),
        card_name_selector: ".js-item-name".to_owned(),
        card_price_selector: ".js-price-display".to_owned(),
        card_image_selector: "img".to_owned(),
        ready_timeout_secs: 5,
        user_agent: "storecat-test/0.1".to_owned(),
        inter_request_delay_ms: 0,
        request_jitter_ms: 0,
        max_retries: 0,
        retry_backoff_base_secs: 0,
        max_backoff_secs: 60,
        max_listing_pages: None,
        stop_on_repeated_page: false,
        log_level: "info".to_owned(),
        output_path,
    }
}

#[tokio::test]
async fn invalid_selector_still_writes_header_only_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("productos.csv");
    let mut config = offline_config(path.clone());
    config.listing_link_selector = "a[[".to_owned();

    let err = run(&config, Flavor::Variants, CancelFlag::default())
        .await
        .unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::Setup(storecat_scraper::ScraperError::InvalidSelector { .. }))
        ),
        "got: {err:?}"
    );
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "name,sku,color,price,link\n"
    );
}

#[tokio::test]
async fn invalid_selector_in_card_flavor_writes_card_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.csv");
    let mut config = offline_config(path.clone());
    config.card_selector = "div[".to_owned();

    assert!(run(&config, Flavor::Cards, CancelFlag::default()).await.is_err());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "name,price,link,image\n"
    );
}
