use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use litsec_identity::{recover_address, JsonRpcWallet, LocalWallet, WalletConnector, WalletProvider};
use litsec_types::LitsecError;
use serde_json::{json, Value};
use std::sync::Arc;

/// Stub wallet: answers `eth_requestAccounts` and `personal_sign` with a
/// local key, or rejects every request with EIP-1193 code 4001.
#[derive(Clone)]
struct StubWallet {
    wallet: LocalWallet,
    reject: bool,
}

async fn rpc(State(stub): State<Arc<StubWallet>>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    if stub.reject {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": 4001, "message": "User rejected the request." }
        }));
    }
    let result = match req["method"].as_str() {
        Some("eth_requestAccounts") => json!([stub.wallet.address().to_hex()]),
        Some("personal_sign") => {
            let data = req["params"][0].as_str().unwrap_or_default();
            let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();
            let message = String::from_utf8(bytes).unwrap();
            json!(stub.wallet.sign_personal(&message).unwrap())
        }
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "method not found" }
            }))
        }
    };
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

async fn start_wallet(reject: bool) -> (String, LocalWallet) {
    let wallet = LocalWallet::random();
    let stub = Arc::new(StubWallet {
        wallet: wallet.clone(),
        reject,
    });
    let app = Router::new().route("/", post(rpc)).with_state(stub);
    (serve(app).await, wallet)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn accounts_and_signature_over_rpc() {
    let (url, local) = start_wallet(false).await;
    let wallet = JsonRpcWallet::new(url);

    let accounts = wallet.request_accounts().await.unwrap();
    assert_eq!(accounts, vec![local.address()]);

    let sig = wallet
        .sign_message(&local.address(), "sign me over rpc")
        .await
        .unwrap();
    assert_eq!(
        recover_address("sign me over rpc", &sig).unwrap(),
        local.address()
    );
}

#[tokio::test]
async fn rejection_maps_to_user_rejected() {
    let (url, _) = start_wallet(true).await;
    let connector = WalletConnector::new(Some(Arc::new(JsonRpcWallet::new(url))));
    let err = connector.connect().await.unwrap_err();
    assert_eq!(
        err,
        LitsecError::UserRejected("User rejected the request.".into())
    );
}

#[tokio::test]
async fn unreachable_wallet_is_network_error() {
    let wallet = JsonRpcWallet::new("http://127.0.0.1:1/");
    assert!(matches!(
        wallet.request_accounts().await,
        Err(LitsecError::Network(_))
    ));
}

#[tokio::test]
async fn gateway_error_page_is_network_error() {
    let app = Router::new().route(
        "/",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>") }),
    );
    let wallet = JsonRpcWallet::new(serve(app).await);
    let err = wallet.request_accounts().await.unwrap_err();
    assert!(matches!(err, LitsecError::Network(ref m) if m.contains("502")));
}

#[tokio::test]
async fn garbled_reply_is_network_error() {
    let app = Router::new().route("/", post(|| async { "not json" }));
    let wallet = JsonRpcWallet::new(serve(app).await);
    assert!(matches!(
        wallet.request_accounts().await,
        Err(LitsecError::Network(_))
    ));
}

#[tokio::test]
async fn other_rpc_errors_are_network_errors() {
    let app = Router::new().route(
        "/",
        post(|Json(req): Json<Value>| async move {
            Json(json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": { "code": 4100, "message": "The requested account has not been authorized." }
            }))
        }),
    );
    let wallet = JsonRpcWallet::new(serve(app).await);
    let err = wallet.request_accounts().await.unwrap_err();
    assert_eq!(
        err,
        LitsecError::Network(
            "wallet error 4100: The requested account has not been authorized.".into()
        )
    );
}
