use anyhow::Context;
use homelab_file_manager::{build_router, logging, AppConfig, AppState};
use std::io;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tracing::{error, info, warn};

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("注册 Ctrl+C 处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("注册 SIGTERM 处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到 Ctrl+C，开始优雅关闭..."),
        _ = terminate => info!("收到 SIGTERM，开始优雅关闭..."),
    }
}

/// 服务器在收到信号前退出时的结果，出错则以非零状态退出
fn early_exit(result: Result<io::Result<()>, JoinError>) -> anyhow::Result<()> {
    match result {
        Ok(Ok(())) => {
            info!("服务器已停止");
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("服务器错误"),
        Err(e) => Err(e).context("服务器任务异常退出"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().await.context("加载配置失败")?;

    // 初始化日志系统（必须保持 _log_guard 存活）
    let _log_guard = logging::init_logging(&config.log);

    info!("Homelab File Manager v{} 启动中...", env!("CARGO_PKG_VERSION"));

    let base_path = &config.filesystem.base_path;
    if !base_path.is_dir() {
        warn!("基础目录不存在或不是目录: {:?}", base_path);
    }

    let addr = config.server.bind_addr();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);

    info!("基础目录: {:?}", base_path);
    if config.filesystem.strict_containment {
        info!("严格路径检查已启用（解析符号链接）");
    }

    let app_state = AppState::new(&config);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;

    info!("服务器启动在: http://{}", addr);
    info!("文件 API: http://{}/file/list?path=/", addr);
    info!("健康检查: http://{}/health", addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut server_task = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server_task => return early_exit(result),
        _ = shutdown_signal() => {}
    }

    // 停止接受新连接，等待进行中的请求完成
    let _ = stop_tx.send(());
    match tokio::time::timeout(shutdown_timeout, server_task).await {
        Ok(Ok(Ok(()))) => info!("服务器已安全退出"),
        Ok(Ok(Err(e))) => error!("服务器关闭时出错: {}", e),
        Ok(Err(e)) => error!("服务器任务异常退出: {}", e),
        Err(_) => warn!(
            "等待请求结束超时（{} 秒），强制退出",
            shutdown_timeout.as_secs()
        ),
    }

    Ok(())
}
