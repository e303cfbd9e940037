#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use waste_router::api::{create_app, AppState};
    use waste_router::MemoryDatabase;

    fn memory_state() -> AppState {
        AppState::new(Arc::new(MemoryDatabase::new()))
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        send(state, Method::GET, uri, None).await
    }

    async fn post(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        send(state, Method::POST, uri, Some(body)).await
    }

    async fn put(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        send(state, Method::PUT, uri, Some(body)).await
    }

    async fn delete(state: &AppState, uri: &str) -> (StatusCode, Value) {
        send(state, Method::DELETE, uri, None).await
    }

    fn detail(message: &str) -> Value {
        json!({ "detail": message })
    }

    async fn create_organization(state: &AppState, x: f64, y: f64, waste: Value) -> i64 {
        let (status, body) = post(
            state,
            "/organizations/",
            json!({ "name": "Org", "location_x": x, "location_y": y, "generated_waste": waste }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["organization_id"].as_i64().unwrap()
    }

    async fn create_storage(
        state: &AppState,
        name: &str,
        x: f64,
        y: f64,
        capacities: Value,
        current_levels: Value,
    ) -> i64 {
        let (status, body) = post(
            state,
            "/storages/",
            json!({
                "name": name,
                "location_x": x,
                "location_y": y,
                "capacities": capacities,
                "current_levels": current_levels,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["storage_id"].as_i64().unwrap()
    }

    /// Organization {BIO_WASTE: 1} at (0,0) and storage {cap 2, level 1} at (100,0)
    async fn reference_scenario(state: &AppState) -> (i64, i64) {
        let organization_id =
            create_organization(state, 0.0, 0.0, json!([{ "waste_type": "BIO_WASTE", "amount": 1 }])).await;
        let storage_id = create_storage(
            state,
            "S2",
            100.0,
            0.0,
            json!([{ "waste_type": "BIO_WASTE", "capacity": 2 }]),
            json!([{ "waste_type": "BIO_WASTE", "current_amount": 1 }]),
        )
        .await;
        (organization_id, storage_id)
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = memory_state();

        let response = create_app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_organization_lifecycle() {
        let state = memory_state();
        let id = create_organization(&state, 1.5, -2.0, json!([{ "waste_type": "GLASS", "amount": 10 }])).await;

        let (status, body) = get(&state, &format!("/organizations/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "id": id,
                "name": "Org",
                "location_x": 1.5,
                "location_y": -2.0,
                "generated_waste": [{ "waste_type": "GLASS", "amount": 10 }],
            })
        );

        // Update replaces every line item
        let (status, body) = put(
            &state,
            &format!("/organizations/{}/", id),
            json!({
                "name": "Renamed",
                "location_x": 3.0,
                "location_y": 4.0,
                "generated_waste": [{ "waste_type": "PLASTIC", "amount": 7 }],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, detail("Organization updated successfully"));

        let (_, body) = get(&state, "/organizations/").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Renamed");
        assert_eq!(body[0]["generated_waste"], json!([{ "waste_type": "PLASTIC", "amount": 7 }]));

        let (status, body) = delete(&state, &format!("/organizations/?organization_id={}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, detail("Organization deleted successfully"));

        let (status, body) = get(&state, &format!("/organizations/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Data not found for specified organization_id."));

        let (status, body) = delete(&state, &format!("/organizations?organization_id={}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Organization not found"));
    }

    #[tokio::test]
    async fn test_update_missing_organization() {
        let state = memory_state();

        let (status, body) = put(
            &state,
            "/organizations/42",
            json!({ "name": "Ghost", "location_x": 0.0, "location_y": 0.0, "generated_waste": [] }),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Organization not found"));
    }

    #[tokio::test]
    async fn test_invalid_organization_payloads_are_unprocessable() {
        let state = memory_state();

        let payloads = [
            json!({ "name": "Org", "location_x": 0.0, "location_y": 0.0 }),
            json!({ "name": "Org", "location_x": 0.0, "location_y": 0.0,
                    "generated_waste": [{ "waste_type": "METAL", "amount": 1 }] }),
            json!({ "name": "Org", "location_x": 0.0, "location_y": 0.0,
                    "generated_waste": [{ "waste_type": "GLASS", "amount": -1 }] }),
            json!({ "name": "Org", "location_x": 0.0, "location_y": 0.0,
                    "generated_waste": [{ "waste_type": "GLASS", "amount": 1 },
                                        { "waste_type": "GLASS", "amount": 2 }] }),
            json!({ "name": "Org", "location_x": -1e308, "location_y": 0.0, "generated_waste": [] }),
            json!({ "name": "Org", "location_x": 0.0, "location_y": 1e308, "generated_waste": [] }),
        ];

        for payload in payloads {
            let (status, body) = post(&state, "/organizations", payload.clone()).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
            assert!(body["detail"].is_string());
        }

        let (status, _) = get(&state, "/organizations/abc").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = get(&state, "/organizations").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_storage_lifecycle() {
        let state = memory_state();
        let id = create_storage(
            &state,
            "S1",
            5.0,
            5.0,
            json!([{ "waste_type": "GLASS", "capacity": 100 }]),
            json!([]),
        )
        .await;

        let (status, body) = get(&state, &format!("/storages/{}/", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["capacities"], json!([{ "waste_type": "GLASS", "capacity": 100 }]));
        assert_eq!(body["current_levels"], json!([]));

        let (status, body) = put(
            &state,
            &format!("/storages/{}", id),
            json!({
                "name": "S1",
                "location_x": 6.0,
                "location_y": 6.0,
                "capacities": [{ "waste_type": "PLASTIC", "capacity": 10 }],
                "current_levels": [{ "waste_type": "PLASTIC", "current_amount": 3 }],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, detail("Storage updated successfully"));

        let (_, body) = get(&state, "/storages").await;
        assert_eq!(body[0]["capacities"], json!([{ "waste_type": "PLASTIC", "capacity": 10 }]));

        let (status, body) = delete(&state, &format!("/storages/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, detail("Storage deleted successfully"));

        for (status, body) in [
            get(&state, &format!("/storages/{}", id)).await,
            delete(&state, &format!("/storages/{}", id)).await,
        ] {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, detail("Storage not found"));
        }
    }

    #[tokio::test]
    async fn test_storage_validation_and_duplicate_names() {
        let state = memory_state();
        create_storage(&state, "S1", 0.0, 0.0, json!([]), json!([])).await;

        let (status, _) = post(
            &state,
            "/storages",
            json!({ "name": "S1", "location_x": 1.0, "location_y": 1.0,
                    "capacities": [], "current_levels": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = post(
            &state,
            "/storages",
            json!({ "name": "S2", "location_x": 1.0, "location_y": 1.0,
                    "capacities": [{ "waste_type": "GLASS", "capacity": 1 }],
                    "current_levels": [{ "waste_type": "GLASS", "current_amount": 2 }] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = post(
            &state,
            "/storages",
            json!({ "name": "S3", "location_x": 1.0, "location_y": 1.0,
                    "capacities": [],
                    "current_levels": [{ "waste_type": "GLASS", "current_amount": 0 }] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_reference_scenario_end_to_end() {
        let state = memory_state();
        let (organization_id, storage_id) = reference_scenario(&state).await;

        let (status, body) = get(
            &state,
            &format!("/organizations/{}/distance-to-storage/{}/", organization_id, storage_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "distance": 100.0 }));

        let (status, body) = get(&state, &format!("/organizations/{}/available-storages/", organization_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "storage_id": storage_id,
                "name": "S2",
                "distance": 100.0,
                "capacities": [{ "waste_type": "BIO_WASTE", "capacity": 2 }],
                "current_levels": [{ "waste_type": "BIO_WASTE", "current_amount": 1 }],
            }])
        );

        let (status, body) = post(
            &state,
            &format!("/organizations/{}/storages/{}/transfer-waste/", organization_id, storage_id),
            json!({ "waste_type": "BIO_WASTE", "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, detail("Waste transferred successfully."));

        let (_, storage) = get(&state, &format!("/storages/{}", storage_id)).await;
        assert_eq!(
            storage["current_levels"],
            json!([{ "waste_type": "BIO_WASTE", "current_amount": 2 }])
        );
        let (_, organization) = get(&state, &format!("/organizations/{}", organization_id)).await;
        assert_eq!(
            organization["generated_waste"],
            json!([{ "waste_type": "BIO_WASTE", "amount": 0 }])
        );

        // Storage is now full
        let (status, body) = post(
            &state,
            &format!("/organizations/{}/storages/{}/transfer-waste", organization_id, storage_id),
            json!({ "waste_type": "BIO_WASTE", "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            detail(&format!(
                "Storage {} does not have sufficient capacity for 1 of waste type BIO_WASTE.",
                storage_id
            ))
        );
    }

    #[tokio::test]
    async fn test_transfer_rejections() {
        let state = memory_state();
        let (organization_id, storage_id) = reference_scenario(&state).await;
        let uri = format!("/organizations/{}/storages/{}/transfer-waste/", organization_id, storage_id);

        let (status, body) = post(&state, &uri, json!({ "waste_type": "GLASS", "amount": 1 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            detail(&format!("Storage {} does not support waste type GLASS.", storage_id))
        );

        let (status, body) = post(&state, &uri, json!({ "waste_type": "BIO_WASTE", "amount": 0 })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, detail("Amount must be greater than zero."));

        let (status, body) = post(
            &state,
            &format!("/organizations/999/storages/{}/transfer-waste", storage_id),
            json!({ "waste_type": "BIO_WASTE", "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Organization not found"));

        let (status, body) = post(
            &state,
            &format!("/organizations/{}/storages/999/transfer-waste", organization_id),
            json!({ "waste_type": "BIO_WASTE", "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Storage not found"));
    }

    #[tokio::test]
    async fn test_transfer_of_type_not_generated() {
        let state = memory_state();
        let organization_id =
            create_organization(&state, 0.0, 0.0, json!([{ "waste_type": "GLASS", "amount": 5 }])).await;
        let storage_id = create_storage(
            &state,
            "S1",
            1.0,
            1.0,
            json!([{ "waste_type": "PLASTIC", "capacity": 10 }]),
            json!([]),
        )
        .await;

        let (status, body) = post(
            &state,
            &format!("/organizations/{}/storages/{}/transfer-waste", organization_id, storage_id),
            json!({ "waste_type": "PLASTIC", "amount": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            detail(&format!(
                "Organization {} does not generate waste type PLASTIC.",
                organization_id
            ))
        );
    }

    #[tokio::test]
    async fn test_available_storages_sorted_and_filtered() {
        let state = memory_state();
        let organization_id = create_organization(
            &state,
            0.0,
            0.0,
            json!([{ "waste_type": "GLASS", "amount": 5 }, { "waste_type": "PLASTIC", "amount": 2 }]),
        )
        .await;

        let both = json!([{ "waste_type": "GLASS", "capacity": 10 }, { "waste_type": "PLASTIC", "capacity": 10 }]);
        let far = create_storage(&state, "far", 30.0, 40.0, both.clone(), json!([])).await;
        // Lacks PLASTIC, so it cannot take the whole demand
        create_storage(&state, "partial", 1.0, 0.0, json!([{ "waste_type": "GLASS", "capacity": 10 }]), json!([]))
            .await;
        let near_a = create_storage(&state, "near-a", 0.0, 5.0, both.clone(), json!([])).await;
        let near_b = create_storage(&state, "near-b", 5.0, 0.0, both.clone(), json!([])).await;
        // Too full for the GLASS demand
        create_storage(
            &state,
            "full",
            0.0,
            1.0,
            both.clone(),
            json!([{ "waste_type": "GLASS", "current_amount": 6 }]),
        )
        .await;

        let (status, body) = get(&state, &format!("/organizations/{}/available-storages", organization_id)).await;
        assert_eq!(status, StatusCode::OK);

        let ranked: Vec<(i64, f64)> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| (s["storage_id"].as_i64().unwrap(), s["distance"].as_f64().unwrap()))
            .collect();
        assert_eq!(ranked, vec![(near_a, 5.0), (near_b, 5.0), (far, 50.0)]);

        let (status, body) = get(&state, "/organizations/999/available-storages").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Organization not found"));
    }

    #[tokio::test]
    async fn test_distance_with_unknown_ids() {
        let state = memory_state();
        let (organization_id, storage_id) = reference_scenario(&state).await;

        for uri in [
            format!("/organizations/{}/distance-to-storage/999", organization_id),
            format!("/organizations/999/distance-to-storage/{}", storage_id),
        ] {
            let (status, body) = get(&state, &uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, detail("Invalid organization or storage"));
        }
    }

    #[tokio::test]
    async fn test_generate_waste() {
        let state = memory_state();
        let (organization_id, _) = reference_scenario(&state).await;

        let (status, body) = get(
            &state,
            &format!("/organizations/{}/generate_waste/?waste_type=BIO_WASTE&amount=4", organization_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            detail(&format!(
                "Successfully added 4 of BIO_WASTE waste to organization {}.",
                organization_id
            ))
        );

        // Undeclared types are declared on first generation
        let (status, _) = get(
            &state,
            &format!("/organizations/{}/generate_waste?waste_type=GLASS&amount=2", organization_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, organization) = get(&state, &format!("/organizations/{}", organization_id)).await;
        assert_eq!(
            organization["generated_waste"],
            json!([
                { "waste_type": "BIO_WASTE", "amount": 5 },
                { "waste_type": "GLASS", "amount": 2 },
            ])
        );

        let (status, body) = get(&state, "/organizations/999/generate_waste?waste_type=GLASS&amount=2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Organization not found"));

        let (status, _) = get(
            &state,
            &format!("/organizations/{}/generate_waste?waste_type=GLASS&amount=0", organization_id),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_generate_waste_beyond_integer_range_is_rejected() {
        let state = memory_state();
        let organization_id =
            create_organization(&state, 0.0, 0.0, json!([{ "waste_type": "GLASS", "amount": i32::MAX }])).await;

        let (status, body) = get(
            &state,
            &format!("/organizations/{}/generate_waste?waste_type=GLASS&amount=1", organization_id),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            detail(&format!(
                "Organization {} cannot hold 1 more of waste type GLASS.",
                organization_id
            ))
        );

        let (_, organization) = get(&state, &format!("/organizations/{}", organization_id)).await;
        assert_eq!(
            organization["generated_waste"],
            json!([{ "waste_type": "GLASS", "amount": i32::MAX }])
        );
    }

    #[tokio::test]
    async fn test_far_away_storage_location_is_unprocessable() {
        let state = memory_state();
        let organization_id = create_organization(&state, 0.0, 0.0, json!([])).await;

        let (status, body) = post(
            &state,
            "/storages",
            json!({ "name": "Far", "location_x": 1e308, "location_y": -1e308,
                    "capacities": [], "current_levels": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (_, storages) = get(&state, "/storages").await;
        assert_eq!(storages, json!([]));

        let (status, _) = get(
            &state,
            &format!("/organizations/{}/available-storages", organization_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_price_lookups() {
        let state = memory_state();

        for (ticker, price, timestamp) in [
            ("btc_usd", 67000.5, 1730181900_i64),
            ("btc_usd", 66000.0, 1730100000),
            ("eth_usd", 2500.25, 1730181900),
            ("btc_usd", 68000.0, 1730200000),
        ] {
            let (status, body) = post(
                &state,
                "/prices/",
                json!({ "ticker": ticker, "price": price, "timestamp": timestamp }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["price_id"].is_i64());
        }

        let (status, body) = get(&state, "/prices/?ticker=btc_usd").await;
        assert_eq!(status, StatusCode::OK);
        let timestamps: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["timestamp"].as_i64().unwrap())
            .collect();
        assert_eq!(timestamps, vec![1730100000, 1730181900, 1730200000]);

        let (status, body) = get(&state, "/prices/latest?ticker=btc_usd").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(68000.0));
        assert_eq!(body["timestamp"], json!(1730200000));

        let (status, body) = get(&state, "/prices/latest?ticker=doge_usd").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, detail("Data not found for specified ticker."));

        // 2024-10-29T09:05:00+03:00 is 1730181900; both bounds inclusive
        let (status, body) = get(
            &state,
            "/prices/history?ticker=btc_usd&start_date=2024-10-29T09:05:00%2B03:00&end_date=2024-10-29T06:05:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["price"], json!(67000.5));

        let (status, body) = get(&state, "/prices/history?ticker=btc_usd&start_date=2024-10-29T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = get(&state, "/prices/latest").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
