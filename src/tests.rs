#[cfg(test)]
mod tests {

    mod slug_tests {
        use crate::services::slug::{generate_slug, validate_slug};

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Summer Gala 2024"), "summer-gala-2024");
        }

        #[test]
        fn test_generate_slug_special_characters() {
            assert_eq!(generate_slug("Ana & Tom's Wedding!"), "ana-tom-s-wedding");
        }

        #[test]
        fn test_generate_slug_unicode() {
            assert_eq!(generate_slug("Café Opening"), "cafe-opening");
        }

        #[test]
        fn test_generate_slug_empty_falls_back() {
            assert_eq!(generate_slug(""), "event");
            assert_eq!(generate_slug("!!!"), "event");
        }

        #[test]
        fn test_generate_slug_truncates_long_names() {
            let slug = generate_slug(&"word ".repeat(40));
            assert!(slug.len() <= 80);
            assert!(!slug.ends_with('-'));
            assert!(validate_slug(&slug));
        }

        #[test]
        fn test_validate_slug() {
            assert!(validate_slug("launch-party"));
            assert!(!validate_slug(""));
            assert!(!validate_slug("Launch-Party"));
            assert!(!validate_slug("launch party"));
        }
    }

    mod guard_tests {
        use crate::services::guard::*;
        use proptest::prelude::*;

        fn state(logged_in: bool, hydrated: bool, pro: bool) -> SessionState {
            SessionState {
                logged_in,
                pro,
                hydrated,
            }
        }

        #[test]
        fn test_auth_only_routes() {
            assert_eq!(decide(RouteRole::AuthOnly, SessionState::ANONYMOUS), GuardDecision::Render);
            assert_eq!(
                decide(RouteRole::AuthOnly, state(true, false, false)),
                GuardDecision::Redirect(HOME_PATH)
            );
            assert_eq!(
                decide(RouteRole::AuthOnly, state(true, true, true)),
                GuardDecision::Redirect(HOME_PATH)
            );
        }

        #[test]
        fn test_optional_routes() {
            assert_eq!(decide(RouteRole::Optional, SessionState::ANONYMOUS), GuardDecision::Render);
            assert_eq!(decide(RouteRole::Optional, state(true, false, false)), GuardDecision::Hydrate);
            assert_eq!(decide(RouteRole::Optional, state(true, true, false)), GuardDecision::Render);
        }

        #[test]
        fn test_protected_routes() {
            assert_eq!(
                decide(RouteRole::Protected, SessionState::ANONYMOUS),
                GuardDecision::Redirect(LOGIN_PATH)
            );
            assert_eq!(decide(RouteRole::Protected, state(true, false, true)), GuardDecision::Hydrate);
            assert_eq!(decide(RouteRole::Protected, state(true, true, false)), GuardDecision::Render);
        }

        #[test]
        fn test_admin_routes() {
            assert_eq!(
                decide(RouteRole::Admin, SessionState::ANONYMOUS),
                GuardDecision::Redirect(LOGIN_PATH)
            );
            assert_eq!(decide(RouteRole::Admin, state(true, false, false)), GuardDecision::Hydrate);
            assert_eq!(
                decide(RouteRole::Admin, state(true, true, false)),
                GuardDecision::Redirect(HOME_PATH)
            );
            assert_eq!(decide(RouteRole::Admin, state(true, true, true)), GuardDecision::Render);
        }

        /// The table written out independently of `decide`.
        fn expected(role: RouteRole, s: SessionState) -> GuardDecision {
            if !s.logged_in {
                return match role {
                    RouteRole::AuthOnly | RouteRole::Optional => GuardDecision::Render,
                    RouteRole::Protected | RouteRole::Admin => GuardDecision::Redirect(LOGIN_PATH),
                };
            }
            if role == RouteRole::AuthOnly {
                return GuardDecision::Redirect(HOME_PATH);
            }
            if !s.hydrated {
                return GuardDecision::Hydrate;
            }
            if role == RouteRole::Admin && !s.pro {
                return GuardDecision::Redirect(HOME_PATH);
            }
            GuardDecision::Render
        }

        proptest! {
            #[test]
            fn prop_decide_matches_table(
                role in prop::sample::select(RouteRole::ALL.to_vec()),
                logged_in in any::<bool>(),
                hydrated in any::<bool>(),
                pro in any::<bool>(),
            ) {
                let s = state(logged_in, hydrated, pro);
                prop_assert_eq!(decide(role, s), expected(role, s));
            }

            #[test]
            fn prop_hydrated_sessions_never_hydrate_again(
                role in prop::sample::select(RouteRole::ALL.to_vec()),
                pro in any::<bool>(),
            ) {
                prop_assert_ne!(decide(role, state(true, true, pro)), GuardDecision::Hydrate);
            }
        }

        #[test]
        fn test_login_redirect_keeps_destination() {
            assert_eq!(login_redirect("/events/4?x=1"), "/login?next=%2Fevents%2F4%3Fx%3D1");
        }

        #[test]
        fn test_login_redirect_drops_unsafe_destinations() {
            assert_eq!(login_redirect(""), "/login");
            assert_eq!(login_redirect("/"), "/login");
            assert_eq!(login_redirect("//evil.example"), "/login");
            assert_eq!(login_redirect("https://evil.example"), "/login");
        }

        #[test]
        fn test_safe_next() {
            assert_eq!(safe_next(Some("/admin/organizations")), "/admin/organizations");
            assert_eq!(safe_next(Some("https://evil.example")), HOME_PATH);
            assert_eq!(safe_next(Some("//evil.example")), HOME_PATH);
            assert_eq!(safe_next(Some("/\\evil.example")), HOME_PATH);
            assert_eq!(safe_next(None), HOME_PATH);
        }
    }

    mod pagination_tests {
        use crate::models::Page;
        use crate::services::pagination::{load_more, walk, Cursor, CursorState};
        use proptest::prelude::*;

        /// Serves `pages` pages of `per_page` numbers, then stops handing out cursors.
        fn fake_listing(pages: usize, per_page: usize) -> impl FnMut(Cursor) -> std::future::Ready<Result<Page<usize>, String>> {
            move |cursor: Cursor| {
                let index = match cursor {
                    Cursor::Start => 0,
                    Cursor::Next(c) => c.parse::<usize>().unwrap(),
                };
                let results = (index * per_page..(index + 1) * per_page).collect();
                let next = if index + 1 < pages {
                    Some((index + 1).to_string())
                } else {
                    None
                };
                std::future::ready(Ok(Page::new(results, next)))
            }
        }

        fn block_on<F: std::future::Future>(f: F) -> F::Output {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap()
                .block_on(f)
        }

        #[test]
        fn test_cursor_from_query() {
            assert_eq!(Cursor::from_query(None), Cursor::Start);
            assert_eq!(Cursor::from_query(Some(String::new())), Cursor::Start);
            assert_eq!(Cursor::from_query(Some("abc".into())), Cursor::Next("abc".into()));
            assert_eq!(Cursor::Next("abc".into()).as_deref(), Some("abc"));
            assert_eq!(Cursor::Start.as_deref(), None);
        }

        #[test]
        fn test_state_stops_on_missing_cursor() {
            let mut state = CursorState::new();
            state.apply(&Page::new(vec![1, 2], Some("next".to_string())));
            assert!(state.has_more());
            assert_eq!(state.next_cursor(), Some(&Cursor::Next("next".to_string())));

            state.apply(&Page::new(vec![3], None));
            assert!(state.is_exhausted());
            assert_eq!(state.pages_loaded, 2);
            assert_eq!(state.items_loaded, 3);
        }

        #[test]
        fn test_state_treats_empty_cursor_as_last_page() {
            let mut state = CursorState::new();
            state.apply(&Page::new(vec![1], Some(String::new())));
            assert!(state.is_exhausted());
        }

        #[test]
        fn test_load_more_failure_keeps_cursor() {
            let mut state = CursorState::resume(Cursor::Next("p2".into()));
            let result: Result<Option<Vec<i32>>, &str> =
                block_on(load_more(&mut state, |_| async { Err::<Page<i32>, &str>("boom") }));
            assert!(result.is_err());
            assert!(state.error);
            assert_eq!(state.next_cursor(), Some(&Cursor::Next("p2".into())));

            let result: Result<Option<Vec<i32>>, &str> =
                block_on(load_more(&mut state, |cursor| async move {
                    assert_eq!(cursor, Cursor::Next("p2".into()));
                    Ok(Page::new(vec![7], None))
                }));
            assert_eq!(result.unwrap(), Some(vec![7]));
            assert!(!state.error);
        }

        #[test]
        fn test_load_more_after_exhaustion_does_not_fetch() {
            let mut state = CursorState::new();
            state.apply(&Page::<i32>::new(vec![], None));
            let result: Result<Option<Vec<i32>>, &str> =
                block_on(load_more(&mut state, |_| async { Err::<Page<i32>, &str>("fetched an exhausted listing") }));
            assert_eq!(result.unwrap(), None);
        }

        #[test]
        fn test_walk_respects_max_pages() {
            let items = block_on(walk(fake_listing(10, 2), 3)).unwrap();
            assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
        }

        #[test]
        fn test_walk_propagates_errors() {
            let result: Result<Vec<i32>, &str> = block_on(walk(
                |cursor: Cursor| async move {
                    match cursor {
                        Cursor::Start => Ok(Page::new(vec![1], Some("2".into()))),
                        Cursor::Next(_) => Err("page 2 failed"),
                    }
                },
                10,
            ));
            assert_eq!(result, Err("page 2 failed"));
        }

        proptest! {
            #[test]
            fn prop_walk_terminates_when_cursor_missing(pages in 1usize..40, per_page in 0usize..5) {
                let mut calls = 0usize;
                let mut listing = fake_listing(pages, per_page);
                let items = block_on(walk(
                    |cursor: Cursor| {
                        calls += 1;
                        listing(cursor)
                    },
                    usize::MAX,
                ))
                .unwrap();
                prop_assert_eq!(calls, pages);
                prop_assert_eq!(items.len(), pages * per_page);
            }
        }
    }

    mod hashid_tests {
        use crate::services::hashid::HashIds;
        use proptest::prelude::*;

        const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        fn hashids() -> HashIds {
            HashIds::new("test salt", ALPHABET, 8).unwrap()
        }

        #[test]
        fn test_encode_is_deterministic_and_padded() {
            let h = hashids();
            let slug = h.encode(42);
            assert_eq!(slug, h.encode(42));
            assert!(slug.len() >= 8);
            assert!(slug.chars().all(|c| ALPHABET.contains(c)));
        }

        #[test]
        fn test_salt_changes_output() {
            let a = HashIds::new("salt one", ALPHABET, 8).unwrap();
            let b = HashIds::new("salt two", ALPHABET, 8).unwrap();
            assert_ne!(a.encode(1), b.encode(1));
            assert_eq!(b.decode(&a.encode(1)).filter(|&id| id == 1), None);
        }

        #[test]
        fn test_decode_rejects_garbage() {
            let h = hashids();
            assert_eq!(h.decode(""), None);
            assert_eq!(h.decode("!!!!!!!!"), None);
            assert_eq!(h.decode("a b c"), None);
        }

        #[test]
        fn test_decode_rejects_tampered_slug() {
            let h = hashids();
            let slug = h.encode(1234);
            let mut chars: Vec<char> = slug.chars().collect();
            let last = chars.len() - 1;
            chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
            let tampered: String = chars.into_iter().collect();
            assert_eq!(h.decode(&tampered), None);
        }

        #[test]
        fn test_new_rejects_bad_alphabets() {
            assert!(HashIds::new("salt", "abc", 8).is_err());
            assert!(HashIds::new("salt", "abcdefghijklmnop qrstuvwxyz", 8).is_err());
        }

        #[test]
        fn test_extremes_round_trip() {
            let h = hashids();
            for id in [0, 1, u64::MAX - 1, u64::MAX] {
                assert_eq!(h.decode(&h.encode(id)), Some(id));
            }
        }

        #[test]
        fn test_secret_path_skips_negative_ids() {
            let h = hashids();
            assert_eq!(h.secret_path(42), Some(format!("/s/{}", h.encode(42))));
            assert_eq!(h.secret_path(0), Some(format!("/s/{}", h.encode(0))));
            assert_eq!(h.secret_path(-1), None);
            assert_eq!(h.secret_path(i64::MIN), None);
        }

        proptest! {
            #[test]
            fn prop_round_trip(id in any::<u64>(), min_length in 0usize..24) {
                let h = HashIds::new("prop salt", ALPHABET, min_length).unwrap();
                let slug = h.encode(id);
                prop_assert!(slug.chars().count() >= min_length);
                prop_assert_eq!(h.decode(&slug), Some(id));
            }

            #[test]
            fn prop_distinct_ids_distinct_slugs(a in any::<u64>(), b in any::<u64>()) {
                prop_assume!(a != b);
                let h = hashids();
                prop_assert_ne!(h.encode(a), h.encode(b));
            }
        }
    }

    mod composite_tests {
        use crate::services::composite::*;
        use crate::services::InvalidInput;
        use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
        use proptest::prelude::*;
        use std::net::IpAddr;
        use std::time::Duration;

        #[test]
        fn test_aspect_ratio_epsilon_boundary() {
            assert!(aspect_ratio_matches(10_000, 10_000, 1.0));
            assert!(aspect_ratio_matches(10_099, 10_000, 1.0));
            assert!(aspect_ratio_matches(9_901, 10_000, 1.0));
            assert!(!aspect_ratio_matches(10_101, 10_000, 1.0));
            assert!(!aspect_ratio_matches(9_899, 10_000, 1.0));
        }

        #[test]
        fn test_aspect_ratio_exact_boundary_is_inclusive() {
            assert!(aspect_ratio_matches(101, 100, 1.0));
            assert!(aspect_ratio_matches(99, 100, 1.0));
            assert!(aspect_ratio_matches(10_100, 10_000, 1.0));
            assert!(aspect_ratio_matches(9_900, 10_000, 1.0));
            assert!(aspect_ratio_matches(151, 100, 1.5));
            assert!(aspect_ratio_matches(149, 100, 1.5));
            assert!(!aspect_ratio_matches(10_102, 10_000, 1.0));
            assert!(!aspect_ratio_matches(152, 100, 1.5));
        }

        proptest! {
            // |w/h - 1| <= 1/100  <=>  100 * |w - h| <= h
            #[test]
            fn prop_square_ratio_matches_integer_bound(w in 1u32..20_000, h in 1u32..20_000) {
                let within = 100 * u64::from(w.abs_diff(h)) <= u64::from(h);
                prop_assert_eq!(aspect_ratio_matches(w, h, 1.0), within);
            }

            // |w/h - 3/2| <= 1/100  <=>  |200w - 300h| <= 2h
            #[test]
            fn prop_three_two_ratio_matches_integer_bound(w in 1u32..20_000, h in 1u32..20_000) {
                let lhs = (200 * i64::from(w) - 300 * i64::from(h)).abs();
                let within = lhs <= 2 * i64::from(h);
                prop_assert_eq!(aspect_ratio_matches(w, h, 1.5), within);
            }

            #[test]
            fn prop_aspect_ratio_is_symmetric_in_scale(w in 1u32..2_000, h in 1u32..2_000, k in 1u32..8) {
                prop_assert_eq!(
                    aspect_ratio_matches(w, h, 1.0),
                    aspect_ratio_matches(w * k, h * k, 1.0)
                );
            }
        }

        #[test]
        fn test_public_ip_classification() {
            let public = ["93.184.216.34", "8.8.8.8", "2606:4700::1111", "::ffff:93.184.216.34"];
            for ip in public {
                assert!(is_public_ip(ip.parse::<IpAddr>().unwrap()), "{} should be public", ip);
            }

            let private = [
                "127.0.0.1",
                "10.1.2.3",
                "172.16.0.1",
                "192.168.1.1",
                "169.254.169.254",
                "0.0.0.0",
                "100.64.0.1",
                "198.18.0.1",
                "192.0.2.1",
                "255.255.255.255",
                "224.0.0.1",
                "::1",
                "::",
                "fd00::1",
                "fe80::1",
                "2001:db8::1",
                "::ffff:127.0.0.1",
                "::ffff:10.0.0.1",
            ];
            for ip in private {
                assert!(!is_public_ip(ip.parse::<IpAddr>().unwrap()), "{} should not be public", ip);
            }
        }

        fn strict_policy() -> SourcePolicy {
            SourcePolicy {
                allow_private_hosts: false,
                max_bytes: 1024,
                timeout: Duration::from_secs(1),
            }
        }

        #[tokio::test]
        async fn test_fetch_refuses_private_hosts() {
            let policy = strict_policy();
            for url in [
                "http://127.0.0.1:9/base.png",
                "http://[::1]/base.png",
                "http://10.0.0.5/base.png",
                "http://169.254.169.254/latest/meta-data",
            ] {
                let err = fetch_image(&policy, url).await.unwrap_err();
                assert!(err.downcast_ref::<InvalidInput>().is_some(), "{} was not refused", url);
            }
        }

        #[tokio::test]
        async fn test_fetch_refuses_other_schemes() {
            let policy = strict_policy();
            for url in ["ftp://example.com/a.png", "file:///etc/passwd", "not a url"] {
                let err = fetch_image(&policy, url).await.unwrap_err();
                assert!(err.downcast_ref::<InvalidInput>().is_some(), "{} was not refused", url);
            }
        }

        #[test]
        fn test_aspect_ratio_rejects_degenerate_input() {
            assert!(!aspect_ratio_matches(0, 10, 1.0));
            assert!(!aspect_ratio_matches(10, 0, 1.0));
            assert!(!aspect_ratio_matches(10, 10, 0.0));
            assert!(!aspect_ratio_matches(10, 10, -1.0));
        }

        #[test]
        fn test_blend_mode_parsing() {
            assert_eq!("multiply".parse::<BlendMode>(), Ok(BlendMode::Multiply));
            assert_eq!(" Screen ".parse::<BlendMode>(), Ok(BlendMode::Screen));
            assert_eq!("source-over".parse::<BlendMode>(), Ok(BlendMode::Normal));
            assert_eq!(BlendMode::parse_or_default(Some("hue")), BlendMode::Normal);
            assert_eq!(BlendMode::parse_or_default(None), BlendMode::Normal);
        }

        #[test]
        fn test_blend_pixel_modes() {
            let base = Rgba([200, 100, 50, 255]);
            let top = Rgba([100, 200, 50, 255]);
            assert_eq!(blend_pixel(base, top, BlendMode::Normal), top);
            assert_eq!(blend_pixel(base, top, BlendMode::Darken), Rgba([100, 100, 50, 255]));
            assert_eq!(blend_pixel(base, top, BlendMode::Lighten), Rgba([200, 200, 50, 255]));

            let white = Rgba([255, 255, 255, 255]);
            let black = Rgba([0, 0, 0, 255]);
            assert_eq!(blend_pixel(base, white, BlendMode::Multiply), base);
            assert_eq!(blend_pixel(base, black, BlendMode::Screen), base);
        }

        #[test]
        fn test_transparent_overlay_keeps_base() {
            let base = Rgba([10, 20, 30, 255]);
            let clear = Rgba([255, 0, 0, 0]);
            for mode in [BlendMode::Normal, BlendMode::Multiply, BlendMode::Overlay] {
                assert_eq!(blend_pixel(base, clear, mode), base);
            }
        }

        #[test]
        fn test_composite_resizes_overlay_to_base() {
            let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255])));
            let overlay = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
            let out = composite(&base, &overlay, BlendMode::Normal);
            assert_eq!(out.dimensions(), (40, 20));
            let centre = out.get_pixel(20, 10);
            assert!(centre[0] > 250 && centre[2] < 5);

            assert_eq!(fit_overlay(&overlay, 40, 20).dimensions(), (40, 20));
            assert_eq!(fit_overlay(&overlay, 16, 16).dimensions(), (16, 16));
        }

        #[test]
        fn test_composite_bytes_outputs_png() {
            let base = encode_png(&RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]))).unwrap();
            let overlay = encode_png(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 128]))).unwrap();
            let png = composite_bytes(&base, &overlay, BlendMode::Screen).unwrap();
            assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        }

        #[test]
        fn test_decode_image_rejects_non_images() {
            assert!(decode_image(b"not an image").is_err());
        }
    }

    mod microsite_tests {
        use crate::models::{CaptureField, MicrositeConfig};
        use crate::services::microsite::*;
        use crate::services::InvalidInput;

        fn field(name: &str) -> CaptureField {
            CaptureField {
                name: name.to_string(),
                label: name.to_string(),
                required: false,
            }
        }

        fn rejects(config: &MicrositeConfig) -> bool {
            validate(config)
                .err()
                .is_some_and(|e| e.downcast_ref::<InvalidInput>().is_some())
        }

        #[test]
        fn test_valid_config_passes() {
            let config = MicrositeConfig {
                logo_url: Some("https://cdn.example.com/logo.png".into()),
                primary_color: Some("#1a2B3c".into()),
                capture_fields: vec![field("email"), field("first_name")],
                legal_text: Some("By sharing you agree to **the terms**.".into()),
                ..Default::default()
            };
            assert!(validate(&config).is_ok());
        }

        #[test]
        fn test_invalid_values_are_input_errors() {
            assert!(rejects(&MicrositeConfig {
                primary_color: Some("blue".into()),
                ..Default::default()
            }));
            assert!(rejects(&MicrositeConfig {
                background_url: Some("javascript:alert(1)".into()),
                ..Default::default()
            }));
            assert!(rejects(&MicrositeConfig {
                capture_fields: vec![field("Email")],
                ..Default::default()
            }));
            assert!(rejects(&MicrositeConfig {
                capture_fields: vec![field("email"), field("email")],
                ..Default::default()
            }));
            assert!(rejects(&MicrositeConfig {
                legal_text: Some("x".repeat(20_001)),
                ..Default::default()
            }));
        }

        #[test]
        fn test_hex_colors() {
            assert!(is_hex_color("#fff"));
            assert!(is_hex_color("#A1b2C3"));
            assert!(!is_hex_color("fff"));
            assert!(!is_hex_color("#ffff"));
        }

        #[test]
        fn test_capture_fields_textarea() {
            let fields = parse_capture_fields("email|Email address|required\n\n phone_number \nName|Your name");
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0].name, "email");
            assert!(fields[0].required);
            assert_eq!(fields[1].label, "phone number");
            assert!(!fields[1].required);
            assert_eq!(fields[2].name, "name");

            let text = format_capture_fields(&fields);
            assert_eq!(parse_capture_fields(&text), fields);
        }

        #[test]
        fn test_css_variables() {
            let css = css_variables(&MicrositeConfig {
                primary_color: Some("#336699".into()),
                background_url: Some("https://cdn.example.com/bg.jpg\"><script>".into()),
                ..Default::default()
            });
            assert!(css.contains("--color-primary: #336699;"));
            assert!(css.contains("--color-primary-light: #3366991a;"));
            assert!(css.contains("url(\"https://cdn.example.com/bg.jpgscript\")"));
            assert!(!css.contains('<'));
        }

        #[test]
        fn test_css_variables_skip_invalid_color() {
            let css = css_variables(&MicrositeConfig {
                primary_color: Some("red; background: url(x)".into()),
                ..Default::default()
            });
            assert!(css.is_empty());
        }

        #[test]
        fn test_legal_text_is_sanitized() {
            let html = render_legal_text("**Terms** <script>alert(1)</script> [site](https://example.com)");
            assert!(html.contains("<strong>Terms</strong>"));
            assert!(!html.contains("<script>"));
            assert!(html.contains("rel=\"noopener noreferrer\""));
        }
    }

    mod upload_tests {
        use crate::models::AssetKind;
        use crate::services::upload::*;

        const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

        #[test]
        fn test_detect_mime_prefers_content() {
            assert_eq!(detect_mime("photo.jpg", PNG_HEADER), "image/png");
            assert_eq!(detect_mime("clip.mp4", b"????"), "video/mp4");
        }

        #[test]
        fn test_validate_upload() {
            assert!(validate_upload(PNG_HEADER, "image/png", 1024).is_ok());
            assert!(validate_upload(PNG_HEADER, "image/png", 4).is_err());
            assert!(validate_upload(b"", "image/png", 1024).is_err());
            assert!(validate_upload(b"MZ", "application/x-msdownload", 1024).is_err());
        }

        #[test]
        fn test_storage_filename_keeps_safe_extension() {
            let name = storage_filename("My Photo.JPG");
            assert!(name.ends_with(".jpg"));
            assert_eq!(name.len(), 36 + 4);
            assert!(!storage_filename("evil.p/h\\p").contains('/'));
        }

        #[test]
        fn test_asset_kind_from_mime() {
            assert_eq!(AssetKind::from_mime("image/gif"), AssetKind::Gif);
            assert_eq!(AssetKind::from_mime("video/mp4"), AssetKind::Video);
            assert_eq!(AssetKind::from_mime("image/png"), AssetKind::Photo);
        }
    }

    mod provider_tests {
        use crate::services::providers::{sign_payload, verify_signature};

        #[test]
        fn test_signature_round_trip() {
            let body = br#"{"type":"checkout.completed"}"#;
            let header = sign_payload("whsec", body);
            assert!(header.starts_with("sha256="));
            assert!(verify_signature("whsec", body, &header));
        }

        #[test]
        fn test_signature_rejections() {
            let body = b"payload";
            let header = sign_payload("whsec", body);
            assert!(!verify_signature("other", body, &header));
            assert!(!verify_signature("whsec", b"payload2", &header));
            assert!(!verify_signature("whsec", body, header.trim_start_matches("sha256=")));
            assert!(!verify_signature("whsec", body, "sha256=zz"));
        }
    }

    mod backend_tests {
        use crate::services::backend::extract_message;

        #[test]
        fn test_extract_message_shapes() {
            assert_eq!(extract_message(r#"{"detail":"Not allowed"}"#).as_deref(), Some("Not allowed"));
            assert_eq!(extract_message(r#"{"error":"Bad prompt"}"#).as_deref(), Some("Bad prompt"));
            assert_eq!(
                extract_message(r#"{"error":{"message":"Card declined"}}"#).as_deref(),
                Some("Card declined")
            );
            assert_eq!(extract_message(r#"{"message":"Quota"}"#).as_deref(), Some("Quota"));
            assert_eq!(extract_message(r#"{"other":1}"#), None);
        }

        #[test]
        fn test_extract_message_plain_text() {
            assert_eq!(extract_message("  Bad Gateway ").as_deref(), Some("Bad Gateway"));
            assert_eq!(extract_message(""), None);
            assert_eq!(extract_message(&"x".repeat(500)), None);
        }
    }

    mod model_tests {
        use crate::models::*;

        #[test]
        fn test_page_deserializes_without_cursor() {
            let page: Page<i64> = serde_json::from_str(r#"{"results":[1,2]}"#).unwrap();
            assert_eq!(page.results, vec![1, 2]);
            assert!(page.is_last());
        }

        #[test]
        fn test_unknown_delivery_mode_is_none() {
            let event: Event = serde_json::from_str(
                r#"{"id":1,"name":"Gala","is_private":false,"delivery":"carrier-pigeon"}"#,
            )
            .unwrap();
            assert_eq!(event.delivery, DeliveryMode::None);
            assert_eq!(event.microsite, MicrositeConfig::default());
        }

        #[test]
        fn test_asset_display_url_falls_back() {
            let asset: Asset = serde_json::from_str(
                r#"{"id":1,"event_id":2,"kind":"video","image_url":"https://cdn/a.jpg","likes":[{"user_id":5}]}"#,
            )
            .unwrap();
            assert_eq!(asset.display_url(), Some("https://cdn/a.jpg"));
            assert_eq!(asset.like_count(), 1);
            assert!(asset.liked_by(5));
            assert!(!asset.liked_by(6));
        }

        #[test]
        fn test_organization_seats() {
            let org = Organization {
                id: 1,
                name: "Acme".into(),
                plan: Plan {
                    name: "team".into(),
                    features: vec!["custom_models".into()],
                    seats: 5,
                    seats_used: 7,
                },
            };
            assert_eq!(org.seats_available(), 0);
            assert!(org.has_feature("custom_models"));
            assert!(!org.has_feature("sso"));
        }

        #[test]
        fn test_user_display_name() {
            let mut user: User = serde_json::from_str(r#"{"id":1,"email":"a@b.co"}"#).unwrap();
            assert_eq!(user.display_name(), "a@b.co");
            user.first_name = "Ada".into();
            assert_eq!(user.display_name(), "Ada");
        }
    }

    mod config_tests {
        use crate::config::{parse_duration, parse_size};
        use crate::Config;
        use std::path::Path;
        use std::time::Duration;

        const MINIMAL: &str = r#"
[site]
title = "Galleries"
url = "http://localhost:3000"

[database]
path = "data/sessions.db"

[backend]
base_url = "http://localhost:8000/api"

[slugs]
salt = "pepper"
"#;

        #[test]
        fn test_config_load_missing_file() {
            let result = Config::load(Path::new("/nonexistent/eventdeck.toml"));
            assert!(result.is_err());
        }

        #[test]
        fn test_minimal_config_uses_defaults() {
            let config = Config::from_toml(MINIMAL).unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.backend.page_size, 24);
            assert_eq!(config.slugs.min_length, 8);
            assert_eq!(config.ui.error_reset_secs, 4);
            assert!(config.providers.payments.is_none());
            assert_eq!(config.auth.session_duration().unwrap(), Duration::from_secs(7 * 86_400));
            assert_eq!(config.uploads.max_bytes().unwrap(), 25 * 1024 * 1024);
        }

        #[test]
        fn test_config_validation() {
            let bad_url = MINIMAL.replace("http://localhost:8000/api", "not a url");
            assert!(Config::from_toml(&bad_url).is_err());

            let empty_salt = MINIMAL.replace("\"pepper\"", "\"\"");
            assert!(Config::from_toml(&empty_salt).is_err());

            let bad_page = MINIMAL.replace("[slugs]", "page_size = 0\n\n[slugs]");
            assert!(Config::from_toml(&bad_page).is_err());
        }

        #[test]
        fn test_config_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("eventdeck.toml");
            std::fs::write(&path, MINIMAL).unwrap();
            let config = Config::load(&path).unwrap();
            assert_eq!(config.site.title, "Galleries");
        }

        #[test]
        fn test_parse_size() {
            assert_eq!(parse_size("512").unwrap(), 512);
            assert_eq!(parse_size("2KB").unwrap(), 2048);
            assert_eq!(parse_size("25mb").unwrap(), 25 * 1024 * 1024);
            assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
            assert!(parse_size("lots").is_err());
        }

        #[test]
        fn test_parse_duration() {
            assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
            assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
            assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
            assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
            assert!(parse_duration("7w").is_err());
            assert!(parse_duration("d").is_err());
            assert!(parse_duration("").is_err());
        }

        #[test]
        fn test_parse_duration_rejects_multibyte_units() {
            assert!(parse_duration("7é").is_err());
            assert!(parse_duration("é").is_err());
            assert!(parse_duration("1日").is_err());
        }

        #[test]
        fn test_parse_duration_rejects_overflow() {
            assert!(parse_duration("999999999999999999d").is_err());
            assert!(parse_duration("18446744073709551615h").is_err());
            assert_eq!(
                parse_duration("18446744073709551615s").unwrap(),
                Duration::from_secs(u64::MAX)
            );
        }

        #[test]
        fn test_session_lifetime_is_capped() {
            let long = MINIMAL.replace("[slugs]", "[auth]\nsession_lifetime = \"366d\"\n\n[slugs]");
            assert!(Config::from_toml(&long).is_err());

            let year = MINIMAL.replace("[slugs]", "[auth]\nsession_lifetime = \"365d\"\n\n[slugs]");
            assert!(Config::from_toml(&year).is_ok());
        }

        #[test]
        fn test_composite_defaults_refuse_private_hosts() {
            let config = Config::from_toml(MINIMAL).unwrap();
            assert!(!config.composite.allow_private_hosts);
            assert_eq!(config.composite.max_source_bytes().unwrap(), 25 * 1024 * 1024);

            let bad = MINIMAL.replace("[slugs]", "[composite]\nmax_source_size = \"lots\"\n\n[slugs]");
            assert!(Config::from_toml(&bad).is_err());
        }
    }
}
