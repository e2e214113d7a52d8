use std::sync::Arc;
use std::thread;

use element_bridge::bindings::{
    Bridge, DefaultAllocator, ElementKind, JsElementAdapter, MirrorHost, NativeConsumer,
    ScriptAdapter, ScriptValue, UiCommandKind,
};
use element_bridge::config::BridgeConfig;

#[test]
fn test_script_to_native_round_trip() {
    let config = BridgeConfig::default();
    let allocator = DefaultAllocator::new();
    let (bridge, queues) = Bridge::new(&config, allocator.clone());
    let host = MirrorHost::new();
    let consumer = NativeConsumer::new(queues, Box::new(host.clone()), &config.consumer)
        .spawn()
        .unwrap();

    {
        let adapter = JsElementAdapter::new(bridge.create_context()).unwrap();
        adapter
            .execute(
                "const f = document.createElement('iframe');\
                 f.width = 320; f.height = 200; f.postMessage('ping');",
            )
            .unwrap();
    }
    drop(bridge);
    consumer.join().unwrap();

    assert_eq!(allocator.live(), 0);
    host.with_state(|state| {
        assert_eq!(state.elements.len(), 1);
        let element = state.elements.values().next().unwrap();
        assert_eq!(element.tag, "iframe");
        assert_eq!(element.properties["width"], "320.000000");
        assert_eq!(element.properties["height"], "200.000000");
        assert_eq!(element.messages, vec!["ping".to_string()]);
        assert!(state.orphans.is_empty());
    });
}

#[test]
fn test_release_waits_for_pending_commands() {
    let config = BridgeConfig::default();
    let allocator = DefaultAllocator::new();
    let (bridge, queues) = Bridge::new(&config, allocator.clone());
    let host = MirrorHost::new();
    let mut consumer = NativeConsumer::new(queues, Box::new(host.clone()), &config.consumer);

    let ctx = bridge.create_context();
    let mut element = ctx.create_element(ElementKind::Iframe);
    element.set("width", ScriptValue::Number(1.0));
    element.post_message(&[ScriptValue::from("last words")]).unwrap();
    drop(element);

    // Nothing applied yet: the handle must still be alive.
    assert_eq!(allocator.live(), 1);

    let stats = consumer.drain();
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.released, 1);
    assert_eq!(allocator.live(), 0);
    host.with_state(|state| {
        assert_eq!(state.log.last().map(|c| c.kind.tag()), Some("invoke"));
    });
}

#[test]
fn test_global_order_across_script_threads() {
    let config = BridgeConfig::default();
    let (bridge, queues) = Bridge::new(&config, DefaultAllocator::new());
    let bridge = Arc::new(bridge);
    let host = MirrorHost::new();
    let mut consumer = NativeConsumer::new(queues, Box::new(host.clone()), &config.consumer);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                let ctx = bridge.create_context();
                for i in 0..25 {
                    let mut element = ctx.create_element(ElementKind::Iframe);
                    element.set("height", ScriptValue::Number(i as f64));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = consumer.drain();
    assert_eq!(stats.applied, 200);
    assert_eq!(stats.released, 100);

    host.with_state(|state| {
        let seqs: Vec<u64> = state.log.iter().map(|c| c.seq).collect();
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        assert!(state.orphans.is_empty());
        for element in state.elements.values() {
            assert!(element.properties.contains_key("height"));
        }
    });
}

#[test]
fn test_class_singleton_is_scoped_to_context() {
    let (bridge, mut queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
    let ctx = bridge.create_context();
    let other = bridge.create_context();

    let a = ctx.element_class(ElementKind::Iframe);
    let b = ctx.element_class(ElementKind::Iframe);
    let c = other.element_class(ElementKind::Iframe);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));

    let element = ctx.create_element(ElementKind::Iframe);
    assert!(matches!(element.get("postMessage"), ScriptValue::Function(_)));

    let commands = queues.commands.drain();
    assert_eq!(
        commands[0].kind,
        UiCommandKind::CreateElement {
            tag: "iframe".to_string()
        }
    );

    drop(element);
    queues.commands.mark_consumed(commands[0].seq);
    assert_eq!(queues.releases.flush(queues.commands.consumed()), 1);
}

#[test]
fn test_config_file_drives_wire_precision() -> anyhow::Result<()> {
    let config = BridgeConfig::from_toml_str(
        r#"
        [commands]
        number_precision = 2
        "#,
    )?;
    config.validate()?;
    let (bridge, queues) = Bridge::new(&config, DefaultAllocator::new());
    let ctx = bridge.create_context();
    let mut element = ctx.create_element(ElementKind::Iframe);
    element.set("width", ScriptValue::from("12.5"));

    let commands = queues.commands.drain();
    assert_eq!(
        commands[1].kind,
        UiCommandKind::SetProperty {
            name: "width".to_string(),
            value: "12.50".to_string()
        }
    );
    Ok(())
}
