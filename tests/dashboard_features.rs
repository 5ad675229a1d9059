mod common;

use std::sync::Arc;

use common::{Reply, ScriptedTransport, client_for};
use finboard_ai::features::{ChatSession, Holding, NewsItem, NewsSummarizer, PortfolioAnalyzer};
use finboard_ai::{CompletionOutcome, Speaker};
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn chat_session_records_turns_and_citations() {
    let transport = ScriptedTransport::new([
        Reply::grounded(
            "The S&P 500 gained 0.8% today.",
            json!([ { "web": { "uri": "https://markets.example/spx", "title": "SPX recap" } } ]),
        ),
        Reply::text("Mostly tech and energy."),
    ]);
    let mut chat = ChatSession::new(Arc::new(client_for(transport.clone())));

    let reply = chat.send("How did the market do?").await.expect("reply");
    assert_eq!(reply.speaker, Speaker::Assistant);
    assert_eq!(reply.citations.len(), 1);

    chat.send("Which sectors led?").await.expect("reply");

    let history = chat.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].speaker, Speaker::User);
    assert_eq!(history[3].text, "Mostly tech and energy.");

    // the second prompt replays the first exchange, and chat is always grounded
    let second = &transport.seen()[1];
    let prompt = second.prompt();
    assert!(prompt.contains("User: How did the market do?"), "{prompt}");
    assert!(prompt.contains("Assistant: The S&P 500 gained 0.8% today."));
    assert!(prompt.ends_with("User: Which sectors led?"));
    assert!(second.body().get("tools").is_some());
}

#[tokio::test(start_paused = true)]
async fn chat_session_shows_failure_inline() {
    let transport = ScriptedTransport::new([Reply::server_error()]);
    let mut chat = ChatSession::new(Arc::new(client_for(transport)));

    let reply = chat.send("Hello?").await.expect("reply");
    assert_eq!(reply.speaker, Speaker::Assistant);
    assert_eq!(reply.text, "Could not get a response after 1 attempt.");
    assert!(reply.citations.is_empty());
    assert_eq!(chat.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn summaries_run_independently() {
    let transport = ScriptedTransport::routed([
        (
            "Summarize the latest market news about Apple Inc. (AAPL).",
            vec![Reply::malformed(), Reply::text("Apple summary")],
        ),
        (
            "Summarize the latest market news about Tesla, Inc. (TSLA).",
            vec![Reply::server_error()],
        ),
        (
            "Summarize the latest market news about MSFT.",
            vec![Reply::text("Microsoft summary")],
        ),
    ]);
    let summarizer = NewsSummarizer::new(Arc::new(client_for(transport.clone())));

    let items = vec![
        NewsItem {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
        },
        NewsItem {
            symbol: "TSLA".to_string(),
            name: "Tesla, Inc.".to_string(),
        },
        NewsItem {
            symbol: "MSFT".to_string(),
            name: String::new(),
        },
    ];
    let outcomes = summarizer.summarize_all(&items).await;

    assert_eq!(
        outcomes,
        vec![
            CompletionOutcome::Success(finboard_ai::CompletionResult {
                text: "Apple summary".to_string(),
                citations: Vec::new(),
            }),
            CompletionOutcome::Failure("Could not get a response after 1 attempt.".to_string()),
            CompletionOutcome::Success(finboard_ai::CompletionResult {
                text: "Microsoft summary".to_string(),
                citations: Vec::new(),
            }),
        ]
    );
    assert_eq!(transport.calls(), 4);
    assert!(
        transport
            .seen()
            .iter()
            .all(|seen| seen.body().get("tools").is_some())
    );
}

#[tokio::test(start_paused = true)]
async fn portfolio_analysis_is_ungrounded() {
    let transport = ScriptedTransport::new([Reply::text("Concentrated in tech.")]);
    let analyzer = PortfolioAnalyzer::new(Arc::new(client_for(transport.clone())));

    let outcome = analyzer
        .analyze(&[
            Holding {
                symbol: "AAPL".to_string(),
                shares: 3.0,
                price: 200.0,
            },
            Holding {
                symbol: "GOOG".to_string(),
                shares: 2.0,
                price: 150.0,
            },
        ])
        .await;

    assert_eq!(outcome.display_text(), "Concentrated in tech.");
    let body = transport.seen()[0].body();
    assert!(body.as_object().expect("object").get("tools").is_none());
    assert!(
        body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .expect("instruction")
            .contains("portfolio analyst")
    );
}

#[tokio::test(start_paused = true)]
async fn empty_portfolio_never_calls_backend() {
    let transport = ScriptedTransport::new(Vec::new());
    let analyzer = PortfolioAnalyzer::new(Arc::new(client_for(transport.clone())));

    let outcome = analyzer.analyze(&[]).await;
    assert!(!outcome.is_success());
    assert_eq!(transport.calls(), 0);
}
