use super::CommandResult;
use crate::secrets::EncryptionMode;
use crate::state::AppState;
use crate::types::{
    IpcErrorCode, IpcResult, KeyValidation, ProviderType, ProviderWithKeyInfo, SaveProviderPayload,
};
use tauri::{Runtime, State};

fn storage_failure<T>(what: &str) -> IpcResult<T> {
    IpcResult::err(IpcErrorCode::Storage, format!("Failed to {what}."))
}

#[tauri::command]
pub async fn provider_list<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<Vec<ProviderWithKeyInfo>>> {
    Ok(IpcResult::ok(
        state.credentials.list_providers_with_key_info().await,
    ))
}

#[tauri::command]
pub async fn provider_get<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<Option<ProviderWithKeyInfo>>> {
    Ok(IpcResult::ok(
        state
            .credentials
            .get_provider_with_key_info(&provider_id)
            .await,
    ))
}

#[tauri::command]
pub async fn provider_save<R: Runtime>(
    state: State<'_, AppState<R>>,
    payload: SaveProviderPayload,
) -> CommandResult<IpcResult<ProviderWithKeyInfo>> {
    let id = payload.config.id.trim().to_string();
    if id.is_empty() {
        return Ok(IpcResult::err(
            IpcErrorCode::Validation,
            "Provider id is required.",
        ));
    }
    if payload.config.name.trim().is_empty() {
        return Ok(IpcResult::err(
            IpcErrorCode::Validation,
            "Provider name is required.",
        ));
    }

    let mut config = payload.config;
    config.id = id.clone();
    if !state.credentials.save_provider_config(config).await {
        return Ok(storage_failure("save provider"));
    }

    let api_key = payload
        .api_key
        .as_deref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    if let Some(api_key) = api_key {
        if !state.credentials.store_key(&id, api_key).await {
            return Ok(storage_failure("store API key"));
        }
    }

    Ok(match state.credentials.get_provider_with_key_info(&id).await {
        Some(info) => IpcResult::ok(info),
        None => storage_failure("read back provider"),
    })
}

#[tauri::command]
pub async fn provider_delete<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<()>> {
    Ok(if state.credentials.delete_provider_config(&provider_id).await {
        IpcResult::ok(())
    } else {
        storage_failure("delete provider")
    })
}

#[tauri::command]
pub async fn provider_set_api_key<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
    api_key: String,
) -> CommandResult<IpcResult<()>> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Ok(IpcResult::err(
            IpcErrorCode::Validation,
            "API key must not be empty.",
        ));
    }
    Ok(if state.credentials.store_key(&provider_id, api_key).await {
        IpcResult::ok(())
    } else {
        storage_failure("store API key")
    })
}

#[tauri::command]
pub async fn provider_delete_api_key<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<()>> {
    Ok(if state.credentials.delete_key(&provider_id).await {
        IpcResult::ok(())
    } else {
        storage_failure("delete API key")
    })
}

#[tauri::command]
pub async fn provider_has_api_key<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<bool>> {
    Ok(IpcResult::ok(state.credentials.has_key(&provider_id).await))
}

#[tauri::command]
pub async fn provider_get_api_key<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<Option<String>>> {
    Ok(IpcResult::ok(state.credentials.get_key(&provider_id).await))
}

#[tauri::command]
pub async fn provider_set_default<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_id: String,
) -> CommandResult<IpcResult<()>> {
    if state
        .credentials
        .get_provider_config(&provider_id)
        .await
        .is_none()
    {
        return Ok(IpcResult::err(
            IpcErrorCode::Validation,
            format!("Unknown provider: {provider_id}"),
        ));
    }
    Ok(if state.credentials.set_default_provider(&provider_id).await {
        IpcResult::ok(())
    } else {
        storage_failure("set default provider")
    })
}

#[tauri::command]
pub async fn provider_get_default<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<Option<String>>> {
    Ok(IpcResult::ok(state.credentials.get_default_provider().await))
}

#[tauri::command]
pub async fn provider_validate_key<R: Runtime>(
    state: State<'_, AppState<R>>,
    provider_type: ProviderType,
    api_key: String,
    base_url: Option<String>,
) -> CommandResult<IpcResult<KeyValidation>> {
    Ok(IpcResult::ok(
        state
            .validator
            .validate(provider_type, &api_key, base_url.as_deref())
            .await,
    ))
}

#[tauri::command]
pub async fn provider_encryption_mode<R: Runtime>(
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<EncryptionMode>> {
    Ok(IpcResult::ok(state.credentials.encryption_mode()))
}
