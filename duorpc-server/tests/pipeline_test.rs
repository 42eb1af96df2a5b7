//! End-to-end tests for the validate → bind → dispatch → respond pipeline

mod common;

use common::{reply_json, server};
use duorpc_core::{Params, ProtocolVersion, Reply, Request};
use duorpc_server::RpcServer;
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_missing_method_any_version() {
    let server = server();

    for request in [
        json!({"jsonrpc": "2.0", "id": 1}),
        json!({"jsonrpc": "2.0", "method": "", "id": 1}),
        json!({"version": "1.1", "id": 1}),
        json!({"version": "1.1", "method": "''", "id": 1}),
        json!({"method": 42, "id": 1}),
    ] {
        let value = reply_json(&server, request.clone()).await;
        assert_eq!(value["error"]["code"], -32600, "request: {}", request);
        assert_eq!(value["error"]["name"], "JSONRPCError");
    }
}

#[tokio::test]
async fn test_unknown_method() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "no.such.method", "id": "x"}),
    )
    .await;

    assert_eq!(value["id"], "x");
    assert_eq!(value["error"]["code"], -32601);
    assert_eq!(value["error"]["message"], "Procedure not found: no.such.method");
}

#[tokio::test]
async fn test_endpoint_scoped_lookup() {
    let request = json!({"jsonrpc": "2.0", "method": "only.admin", "id": 1});

    let value = reply_json(&server(), request.clone()).await;
    assert_eq!(value["error"]["code"], -32601);

    let admin = RpcServer::builder()
        .registry(Arc::new(common::registry()))
        .endpoint("admin")
        .build()
        .unwrap();
    let value = reply_json(&admin, request).await;
    assert_eq!(value["result"], "secret");
}

#[tokio::test]
async fn test_too_many_params_by_bucket() {
    let server = server();

    let cases = [
        ("system.ping", json!([1]), "The method system.ping does not take any arguments, 1 given"),
        ("echo", json!([1, 2]), "The method echo takes 1 argument, 2 given"),
        ("math.add", json!([1, 2, 3]), "The method math.add takes 2 arguments, 3 given"),
    ];

    for (method, params, message) in cases {
        let value = reply_json(
            &server,
            json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1}),
        )
        .await;
        assert_eq!(value["error"]["code"], -32602);
        assert_eq!(value["error"]["message"], message);
    }
}

#[tokio::test]
async fn test_v2_rejects_mixed_params() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "pair", "params": {"0": "x", "name": "y"}, "id": 1}),
    )
    .await;

    assert_eq!(value["error"]["code"], -32602);
}

#[tokio::test]
async fn test_v1_allows_mixed_params() {
    let value = reply_json(
        &server(),
        json!({"version": "1.1", "method": "pair", "params": {"0": "x", "name": "y"}, "id": 1}),
    )
    .await;

    assert_eq!(value["version"], "1.1");
    assert_eq!(value["result"], json!(["x", "y"]));
}

#[tokio::test]
async fn test_v1_collision() {
    let value = reply_json(
        &server(),
        json!({"version": "1.1", "method": "pair", "params": {"0": "A", "first": "B"}, "id": 1}),
    )
    .await;

    assert_eq!(value["error"]["code"], -32602);
    assert_eq!(
        value["error"]["message"],
        "Argument first was supplied both at position 0 and by name"
    );
}

#[tokio::test]
async fn test_struct_coercion() {
    let server = server();

    let record = reply_json(
        &server,
        json!({"jsonrpc": "2.0", "method": "user.save", "params": [{"a": 1, "b": 2}], "id": 1}),
    )
    .await;
    assert_eq!(record["result"], json!({"a": 1, "b": 2}));

    let keyed = reply_json(
        &server,
        json!({"jsonrpc": "2.0", "method": "user.save", "params": [{"0": 1, "a": 2}], "id": 2}),
    )
    .await;
    assert_eq!(keyed["result"], json!({"0": 1, "a": 2}));

    let scalar = reply_json(
        &server,
        json!({"jsonrpc": "2.0", "method": "user.save", "params": ["not a record"], "id": 3}),
    )
    .await;
    assert!(scalar.get("result").is_some());
}

#[tokio::test]
async fn test_composite_for_scalar_argument() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "math.add", "params": {"a": [1], "b": 2}, "id": 1}),
    )
    .await;

    assert_eq!(value["error"]["code"], -32602);
    assert_eq!(value["error"]["data"]["argument"], "a");
    assert_eq!(value["error"]["data"]["expected"], "int");
    assert_eq!(value["error"]["data"]["received"], "array");
}

#[tokio::test]
async fn test_numeric_strings_pass_unchanged() {
    let server = server();

    for text in ["40", "2.5", "123456789012345678901234567890"] {
        let value = reply_json(
            &server,
            json!({"jsonrpc": "2.0", "method": "num.raw", "params": [text], "id": 1}),
        )
        .await;
        assert_eq!(value["result"], text);
    }

    let value = reply_json(
        &server,
        json!({"jsonrpc": "2.0", "method": "num.raw", "params": ["forty"], "id": 2}),
    )
    .await;
    assert_eq!(value["error"]["code"], -32602);
    assert_eq!(value["error"]["data"]["received"], "string");
}

#[tokio::test]
async fn test_array_argument() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "list.sum", "params": {"items": [1, 2.5]}, "id": 1}),
    )
    .await;

    assert_eq!(value["result"], 3.5);
}

#[tokio::test]
async fn test_notification_has_no_body() {
    let server = server();

    let reply = server
        .handle_value(&json!({"jsonrpc": "2.0", "method": "system.ping"}))
        .await
        .unwrap();
    assert_eq!(reply, Reply::NoContent);

    let reply = server
        .handle_value(&json!({"jsonrpc": "2.0", "method": "system.ping", "id": 7}))
        .await
        .unwrap();
    assert_eq!(
        reply.body(),
        Some(r#"{"jsonrpc":"2.0","id":7,"result":"pong"}"#)
    );
}

#[tokio::test]
async fn test_failed_notification_has_no_body() {
    let reply = server()
        .handle_value(&json!({"jsonrpc": "2.0", "method": "no.such.method"}))
        .await
        .unwrap();

    assert!(reply.is_no_content());
}

#[tokio::test]
async fn test_empty_and_null_ids() {
    let server = server();

    for id in [Value::Null, json!("")] {
        let reply = server
            .handle_value(&json!({"jsonrpc": "2.0", "method": "system.ping", "id": id}))
            .await
            .unwrap();
        assert!(reply.is_no_content());
    }

    // Zero is a real identifier
    let value = reply_json(&server, json!({"jsonrpc": "2.0", "method": "system.ping", "id": 0})).await;
    assert_eq!(value["id"], 0);
}

#[tokio::test]
async fn test_non_scalar_id() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "system.ping", "id": {"n": 1}}),
    )
    .await;

    assert_eq!(value["error"]["code"], -32600);
    assert!(value.get("id").is_none());
}

#[tokio::test]
async fn test_success_round_trip() {
    let server = server();

    for (request, id) in [
        (json!({"jsonrpc": "2.0", "method": "echo", "params": ["hi"], "id": 11}), Some(json!(11))),
        (json!({"version": "1.1", "method": "echo", "params": ["hi"], "id": "abc"}), Some(json!("abc"))),
        (json!({"version": "1.1", "method": "echo", "params": ["hi"]}), None),
    ] {
        let value = reply_json(&server, request).await;
        assert_eq!(value["result"], "hi");
        assert!(value.get("error").is_none());
        assert_eq!(value.get("id").cloned(), id);
    }
}

#[tokio::test]
async fn test_version_tags() {
    let server = server();

    let v2 = reply_json(&server, json!({"jsonrpc": "2.0", "method": "system.ping", "id": 1})).await;
    assert_eq!(v2["jsonrpc"], "2.0");
    assert!(v2.get("version").is_none());

    let v1 = reply_json(&server, json!({"version": "1.0", "method": "system.ping", "id": 1})).await;
    assert_eq!(v1["version"], "1.1");
    assert!(v1.get("jsonrpc").is_none());
}

#[tokio::test]
async fn test_optional_default() {
    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "greet", "params": [], "id": 1}),
    )
    .await;
    assert_eq!(value["result"], "fallback");

    let value = reply_json(
        &server(),
        json!({"jsonrpc": "2.0", "method": "greet", "params": {"mode": "loud"}, "id": 2}),
    )
    .await;
    assert_eq!(value["result"], "loud");
}

#[tokio::test]
async fn test_application_errors() {
    let server = server();

    let coded = reply_json(&server, json!({"jsonrpc": "2.0", "method": "fail.app", "id": 1})).await;
    assert_eq!(coded["error"]["code"], 1001);
    assert_eq!(coded["error"]["message"], "Quota exceeded");
    assert_eq!(coded["error"]["data"], json!({"quota": 10}));

    let plain = reply_json(&server, json!({"jsonrpc": "2.0", "method": "fail.plain", "id": 2})).await;
    assert_eq!(plain["error"]["code"], -32603);
    assert_eq!(plain["error"]["message"], "Something went wrong");
}

#[tokio::test]
async fn test_panicking_method() {
    let value = reply_json(&server(), json!({"jsonrpc": "2.0", "method": "fail.panic", "id": 1})).await;

    assert_eq!(value["error"]["code"], -32603);
    assert_eq!(value["error"]["message"], "method exploded");
}

#[tokio::test]
async fn test_scalar_params_parse_error() {
    let value = reply_json(
        &server(),
        json!({"version": "1.1", "method": "echo", "params": "hi", "id": 1}),
    )
    .await;

    assert_eq!(value["error"]["code"], -32700);
}

#[tokio::test]
async fn test_scalar_params_checked_before_lookup() {
    let server = server();

    for version in [json!({"jsonrpc": "2.0"}), json!({"version": "1.1"})] {
        let mut request = json!({"method": "no.such.method", "params": 5, "id": 1});
        for (key, tag) in version.as_object().unwrap() {
            request[key] = tag.clone();
        }
        let value = reply_json(&server, request).await;
        assert_eq!(value["error"]["code"], -32700);
    }
}

#[tokio::test]
async fn test_raw_text_entry() {
    let server = server();

    let reply = server
        .handle_str(r#"{"jsonrpc":"2.0","method":"math.add","params":{"a":1,"b":2},"id":"q"}"#)
        .await
        .unwrap();
    assert_eq!(reply.body(), Some(r#"{"jsonrpc":"2.0","id":"q","result":3}"#));

    let reply = server.handle_str("{\"jsonrpc\": \"2.0\", ").await.unwrap();
    let value: Value = serde_json::from_str(reply.body().unwrap()).unwrap();
    assert_eq!(value["error"]["code"], -32700);
}

#[tokio::test]
async fn test_programmatic_call() {
    let request = Request::new(
        "math.add",
        Params::Positional(vec![json!(20), json!(22)]),
        None,
        ProtocolVersion::v2(),
    );

    assert_eq!(server().call(&request).await.unwrap(), json!(42));

    // The same request as a notification produces no reply
    assert!(server().handle(&request).await.unwrap().is_no_content());
}

#[tokio::test]
async fn test_concurrent_calls_share_server() {
    let server = server();
    let mut tasks = Vec::new();

    for i in 0..16i64 {
        let server = server.clone();
        tasks.push(tokio::spawn(async move {
            let request = json!({"jsonrpc": "2.0", "method": "math.add", "params": [i, i], "id": i});
            reply_json(&server, request).await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let value = task.await.unwrap();
        assert_eq!(value["id"], i as i64);
        assert_eq!(value["result"], 2 * i as i64);
    }
}
