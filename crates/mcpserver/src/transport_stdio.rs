use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::server::Server;
use crate::types::{new_error_response, JsonRpcRequest, JsonRpcResponse, McpError, ERR_CODE_PARSE};

/// Serve newline-delimited JSON-RPC from `reader`, writing one response line
/// per request to `writer`.
///
/// Every request is handled on its own task, so responses are written in
/// completion order rather than arrival order. Returns once `reader` reaches
/// EOF and all in-flight requests have been answered.
pub async fn serve<R, W>(server: Arc<Server>, reader: R, mut writer: W) -> Result<(), McpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

    let read_loop = async move {
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(req) => {
                    let server = server.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let silent = req.id.is_none();
                        let resp = server.handle(req).await;
                        if !silent && !resp.is_notification() {
                            // Receiver only goes away when the writer failed.
                            let _ = tx.send(resp);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable stdio message");
                    let resp =
                        new_error_response(None, ERR_CODE_PARSE, format!("invalid JSON: {}", e));
                    if tx.send(resp).is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("stdin closed, stopping stdio transport");
        Ok::<(), McpError>(())
    };

    // Ends once the reader and every spawned request have dropped their sender.
    let write_loop = async {
        while let Some(resp) = rx.recv().await {
            let mut out = serde_json::to_vec(&resp)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
        Ok::<(), McpError>(())
    };

    tokio::try_join!(read_loop, write_loop)?;
    Ok(())
}
