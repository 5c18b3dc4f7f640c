mod test_utils;

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;
    use tower::util::ServiceExt;

    use dazzling::ai::Persona;
    use dazzling::client::{ChatClient, ChatState, ChatUpdate, TurnOutcome};
    use dazzling::openai::{CompletionOptions, OpenAiClient, Role};
    use dazzling::sse::DONE_RECORD;

    use crate::test_utils::{
        FakeProvider, Script, body_to_string, chat_body, test_app, test_app_with_static,
        test_prompts,
    };

    /// Serve `app` on an ephemeral port and return its base url
    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn it_chats_end_to_end_with_the_audio_specialist() {
        let provider = FakeProvider::new(Script::Reply(vec!["안녕", "하세요!"]));
        let base_url = spawn_server(test_app(provider.clone())).await;

        let client = ChatClient::new(&base_url, Persona::Audio);
        let before = client.conversation().len();

        let mut streamed = String::new();
        let mut states = Vec::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            client.submit("안녕", |update| match update {
                ChatUpdate::Delta(fragment) => streamed.push_str(fragment),
                ChatUpdate::State(state) => states.push(state),
            }),
        )
        .await
        .unwrap()
        .unwrap();

        let TurnOutcome::Completed(id) = outcome else {
            panic!("Turn failed: {:?}", outcome);
        };

        // The relay saw the audio specialist prompt then the visitor
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let transcript = &requests[0];
        assert_eq!(transcript[0].role, Role::System);
        assert_eq!(
            transcript[0].content,
            test_prompts().system_prompt(Persona::Audio)
        );
        let last = transcript.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "안녕");

        // One user message and exactly one assembled reply were added
        let conversation = client.conversation();
        assert_eq!(conversation.len(), before + 2);
        let reply = conversation.get(id).unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "안녕하세요!");
        assert_eq!(streamed, "안녕하세요!");

        assert_eq!(
            states,
            vec![ChatState::Sending, ChatState::Streaming, ChatState::Idle]
        );
        assert_eq!(client.state(), ChatState::Idle);
    }

    #[tokio::test]
    async fn it_apologizes_when_the_upstream_is_down() {
        let provider = FakeProvider::new(Script::FailSetup);
        let base_url = spawn_server(test_app(provider)).await;

        let client = ChatClient::new(&base_url, Persona::Webdev);
        let outcome = client.submit("Can you build a shop?", |_| {}).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert_eq!(client.state(), ChatState::Idle);
        let last = client.conversation().last().cloned().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, dazzling::client::APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn it_serves_the_studio_site() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<html><body>Welcome to DAZZLING STUDIO</body></html>",
        )
        .unwrap();

        let app = test_app_with_static(FakeProvider::new(Script::Reply(vec![])), dir.path());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            headers[header::REFERRER_POLICY],
            "strict-origin-when-cross-origin"
        );

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Welcome to DAZZLING STUDIO"));
    }

    #[tokio::test]
    async fn it_returns_404_for_missing_static_files() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app_with_static(FakeProvider::new(Script::Reply(vec![])), dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/missing.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Drives the real provider client against a mocked upstream that
    /// splits a record across writes and sends role-only chunks.
    #[tokio::test]
    async fn it_relays_a_mocked_upstream() {
        let mut server = mockito::Server::new_async().await;
        let upstream_body = [
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]
        .concat();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-api-key")
            .match_body(mockito::Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                let (head, tail) = upstream_body.as_bytes().split_at(90);
                w.write_all(head)?;
                w.write_all(tail)
            })
            .create_async()
            .await;

        let provider = Arc::new(OpenAiClient::new(
            &server.url(),
            "test-api-key",
            CompletionOptions::new("gpt-4o"),
        ));
        let app = test_app(provider);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(chat_body(
                        json!([{"role": "user", "content": "Hi"}]),
                        Some("general"),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = tokio::time::timeout(
            Duration::from_secs(10),
            body_to_string(response.into_body()),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert!(body.ends_with(DONE_RECORD));

        let fragments: Vec<String> = body
            .split_terminator("\n\n")
            .filter_map(|r| r.strip_prefix("data: "))
            .filter(|d| *d != "[DONE]")
            .map(|d| {
                let value: serde_json::Value = serde_json::from_str(d).unwrap();
                value["choices"][0]["delta"]["content"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }
}
