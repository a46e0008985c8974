//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP. The first test drives the `build_*`/`parse_*`
//! pairs with a blocking ureq transport, so the request building and response
//! parsing are checked without the async stack. The second runs the
//! view-models over `ReqwestTransport`.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use band_core::{
    ApiConfig, ApiError, BandClient, BandRequest, BandSearchRequest, BandViewModel, Coordinates,
    GrammyClient, GrammyViewModel, HttpMethod, HttpRequest, HttpResponse, Label, MusicGenre,
    PageRequest,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.path)
            .content_type("application/xml")
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => agent
            .put(&req.path)
            .content_type("application/xml")
            .send(body.as_bytes()),
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.body_mut().read_to_string().unwrap_or_default();
    let response = HttpResponse::new(status, body);
    match content_type {
        Some(ct) => response.with_header("content-type", &ct),
        None => response,
    }
}

/// Start the mock server on its own thread and return its address.
fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn request(name: &str, participants: i64, singles: i64, genre: MusicGenre) -> BandRequest {
    BandRequest {
        name: name.to_string(),
        coordinates: Coordinates { x: 10, y: -20 },
        number_of_participants: participants,
        albums_count: 3,
        singles_count: singles,
        music_genre: genre,
        label: Some(Label {
            name: "Rough Trade & Sons".to_string(),
            sales: 5000,
        }),
    }
}

#[test]
fn crud_lifecycle() {
    let addr = spawn_server();
    let client = BandClient::new(&format!("http://{addr}/bands"));
    let grammy = GrammyClient::new(&format!("http://{addr}/grammy"));

    // Step 1: list, the empty envelope still carries pagination.
    let req = client.build_all_bands(PageRequest::default());
    let page = client.parse_band_page(execute(req)).unwrap();
    assert!(page.items.is_empty(), "expected empty list");
    assert_eq!(page.pagination.total_count, 0);

    // Step 2: create, with characters that need escaping.
    let input = request("Simon <&> Garfunkel", 2, 4, MusicGenre::ProgressiveRock);
    let req = client.build_create_band(&input);
    let created = client.parse_create_band(execute(req)).unwrap();
    assert_eq!(created.name, "Simon <&> Garfunkel");
    assert_eq!(created.genre, MusicGenre::ProgressiveRock);
    assert_eq!(created.coordinates, Coordinates { x: 10, y: -20 });
    assert_eq!(created.label.as_ref().map(|l| l.name.as_str()), Some("Rough Trade & Sons"));
    let id = created.id;

    // Step 3: get.
    let req = client.build_get_band(id);
    let fetched = client.parse_get_band(execute(req)).unwrap();
    assert_eq!(fetched, created);

    // Step 4: update without a label.
    let mut input = BandRequest::from(&created);
    input.label = None;
    input.music_genre = MusicGenre::HipHop;
    let req = client.build_update_band(id, &input);
    let updated = client.parse_update_band(execute(req)).unwrap();
    assert_eq!(updated.id, id);
    assert_eq!(updated.genre, MusicGenre::HipHop);
    assert_eq!(updated.label, None);
    assert_eq!(updated.creation_date, created.creation_date);

    // Step 5: a second band, then filter and count.
    let req = client.build_create_band(&request("Slayer", 4, 9, MusicGenre::PunkRock));
    client.parse_create_band(execute(req)).unwrap();

    let filter = BandSearchRequest {
        genre: Some(MusicGenre::PunkRock),
        ..BandSearchRequest::default()
    };
    let req = client.build_filter_bands(&filter, PageRequest::new(1, 10));
    let page = client.parse_band_page(execute(req)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Slayer");

    let filter = BandSearchRequest {
        sort: Some("singlesCount,desc".to_string()),
        ..BandSearchRequest::default()
    };
    let req = client.build_filter_bands(&filter, PageRequest::new(1, 10));
    let page = client.parse_band_page(execute(req)).unwrap();
    let names: Vec<&str> = page.items.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Slayer", "Simon <&> Garfunkel"]);

    let req = client.build_search_by_name("Garf", PageRequest::default());
    let page = client.parse_band_page(execute(req)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, id);

    let req = client.build_count_equal_singles(9);
    assert_eq!(client.parse_count(execute(req)).unwrap(), 1);
    let req = client.build_count_greater_singles(0);
    assert_eq!(client.parse_count(execute(req)).unwrap(), 2);

    // Step 6: grammy actions.
    let req = grammy.build_add_single(id);
    let band = grammy.parse_add_single(execute(req)).unwrap();
    assert_eq!(band.singles_count, 5);

    let req = grammy.build_remove_participant(id);
    let band = grammy.parse_remove_participant(execute(req)).unwrap();
    assert_eq!(band.number_of_participants, 1);

    let req = grammy.build_remove_participant(id);
    let err = grammy.parse_remove_participant(execute(req)).unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("at least one participant"), "{err}");

    // Step 7: delete.
    let req = client.build_delete_band(id);
    client.parse_delete_band(execute(req)).unwrap();

    // Step 8: get after delete gives 404 with an empty body.
    let req = client.build_get_band(id);
    let err = client.parse_get_band(execute(req)).unwrap_err();
    assert_eq!(
        err,
        ApiError::NotFound {
            message: "HTTP 404".to_string()
        }
    );

    // Step 9: update after delete gives 404 with the server's message.
    let req = client.build_update_band(id, &input);
    let err = client.parse_update_band(execute(req)).unwrap_err();
    assert_eq!(err.to_string(), format!("Band with band-id {id} not found"));

    // Step 10: create rejected by validation.
    let req = client.build_create_band(&request("   ", 2, 0, MusicGenre::HipHop));
    let err = client.parse_create_band(execute(req)).unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn view_models_over_reqwest() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));

    let config = ApiConfig::from_lookup(|var| match var {
        "BANDS_API_URL" => Some(format!("http://{addr}/bands")),
        "GRAMMY_API_URL" => Some(format!("http://{addr}/grammy")),
        _ => None,
    });
    let bands = BandViewModel::from_config(&config);
    let grammy = GrammyViewModel::from_config(&config);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = bands.subscribe(move |state| sink.borrow_mut().push(state.loading));

    let created = bands
        .create_band(&request("Queen", 4, 20, MusicGenre::ProgressiveRock))
        .await
        .unwrap();
    assert_eq!(bands.current_band(), Some(created.clone()));
    assert_eq!(*seen.borrow(), vec![true, false]);

    bands.load_all_bands(PageRequest::default()).await.unwrap();
    assert_eq!(bands.bands(), vec![created.clone()]);
    assert_eq!(bands.pagination().map(|p| p.total_count), Some(1));

    assert_eq!(bands.count_greater_singles(19).await.unwrap(), 1);

    let band = grammy.add_single(created.id).await.unwrap();
    assert_eq!(band.singles_count, 21);
    assert!(!grammy.state().loading);

    bands.delete_band(created.id).await.unwrap();
    assert!(bands.bands().is_empty());
    assert_eq!(bands.current_band(), None);

    let draft = BandRequest::from(&created);
    let err = bands.update_band(created.id, &draft).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        bands.state().error,
        Some(format!("Band with band-id {} not found", created.id))
    );

    let err = bands.get_band(created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(bands.state().error.as_deref(), Some("HTTP 404"));
    assert!(!bands.state().loading);
}
