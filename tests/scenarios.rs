//! End-to-end resolve scenarios against a scripted processor/scrape
//! backend. Loop detection is exercised as a unit test on the fingerprint
//! helper in `src/phase.rs`, since a monotonically increasing phase number
//! makes a real duplicate unreachable through a legitimate multi-phase
//! script (see DESIGN.md).

mod common;

use common::{text_response, ScriptedHttpClient};
use nipl_engine::ResolverConfig;

#[tokio::test]
async fn v1_terminal_line_plays_directly() {
    let client = ScriptedHttpClient::new(vec![text_response(
        "http://media.example/clip.mp4",
    )]);
    let descriptor = nipl_engine::resolve(
        "http://source.example/watch?id=1",
        "http://processor.example/resolve",
        &client,
        &ResolverConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(descriptor.url, "http://media.example/clip.mp4");
    assert_eq!(descriptor.referer, "http://source.example/watch?id=1");
}

#[tokio::test]
async fn v1_scrape_advances_then_plays() {
    let client = ScriptedHttpClient::new(vec![
        text_response("http://interstitial.example/page\nid=(\\d+)"),
        text_response("page id=777 here"),
        text_response("http://media.example/final.mp4"),
    ]);
    let descriptor = nipl_engine::resolve(
        "http://source.example/watch?id=1",
        "http://processor.example/resolve",
        &client,
        &ResolverConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(descriptor.url, "http://media.example/final.mp4");
    assert_eq!(descriptor.referer, "http://interstitial.example/page");
    assert_eq!(
        client.requested_urls().len(),
        3,
        "processor fetch, scrape fetch, second processor fetch"
    );
}

#[tokio::test]
async fn v2_assign_then_play() {
    let client = ScriptedHttpClient::new(vec![text_response(
        "v2\nurl='http://media.example/simple.mp4\nagent='CustomAgent\nplay",
    )]);
    let descriptor = nipl_engine::resolve(
        "http://source.example/watch",
        "http://processor.example/resolve",
        &client,
        &ResolverConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(descriptor.url, "http://media.example/simple.mp4");
    assert_eq!(descriptor.agent, "CustomAgent");
}

#[tokio::test]
async fn v2_if_else_picks_the_true_branch() {
    let client = ScriptedHttpClient::new(vec![text_response(
        "v2\nfoo='yes\nif foo = 'yes\nurl='http://media.example/a.mp4\nelse\nurl='http://media.example/b.mp4\nendif\nplay",
    )]);
    let descriptor = nipl_engine::resolve(
        "http://source.example/watch",
        "http://processor.example/resolve",
        &client,
        &ResolverConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(descriptor.url, "http://media.example/a.mp4");
}

#[tokio::test]
async fn v2_scrape_match_report_drives_a_second_phase() {
    let client = ScriptedHttpClient::new(vec![
        text_response(
            "v2\ns_url='http://api.example/step1\nregex='id=(\\d+)\nscrape\nreport",
        ),
        text_response("id=555"),
        text_response("v2\nurl='http://media.example/stream.mp4\nplay"),
    ]);
    let descriptor = nipl_engine::resolve(
        "http://source.example/watch",
        "http://processor.example/resolve",
        &client,
        &ResolverConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(descriptor.url, "http://media.example/stream.mp4");
    let urls = client.requested_urls();
    assert!(urls[2].contains("phase=1"));
    assert!(urls[2].contains("v1=555"));
}

#[tokio::test]
async fn configured_default_agent_drives_the_processor_fetch() {
    let client = ScriptedHttpClient::new(vec![text_response(
        "v2\nurl='http://media.example/simple.mp4\nplay",
    )]);
    let config = nipl_engine::ResolverConfigBuilder::default()
        .default_agent("CustomBotAgent/1.0")
        .build();
    nipl_engine::resolve(
        "http://source.example/watch",
        "http://processor.example/resolve",
        &client,
        &config,
        None,
    )
    .await
    .unwrap();

    assert_eq!(client.requested_agents(), vec!["CustomBotAgent/1.0"]);
}

#[tokio::test]
async fn max_phases_cap_aborts_a_runaway_script() {
    let client = ScriptedHttpClient::new(vec![
        text_response("v2\nreport"),
        text_response("v2\nreport"),
    ]);
    let config = nipl_engine::ResolverConfigBuilder::default()
        .max_phases(1u32)
        .build();
    let err = nipl_engine::resolve(
        "http://source.example/watch",
        "http://processor.example/resolve",
        &client,
        &config,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, nipl_engine::ResolveError::Loop(_)));
}
