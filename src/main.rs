use element_bridge::bindings::{
    Bridge, DefaultAllocator, JsElementAdapter, MirrorHost, NativeConsumer, ScriptAdapter,
};
use element_bridge::config::BridgeConfig;
use element_bridge::core::{init_logging, BridgeResult};

const DEMO_SCRIPT: &str = r#"
const frame = document.createElement('iframe');
frame.width = 640;
frame.height = '480';
frame.postMessage('hello from script');
console.log('iframe ' + frame.width + 'x' + frame.height);

const other = new IFrameElement();
other.width = 'auto';
other.postMessage('second');
"#;

fn run() -> BridgeResult<()> {
    let mut config = BridgeConfig::load_or_default();
    config.apply_env_overrides();
    config.validate()?;
    init_logging(&config.logging);

    let allocator = DefaultAllocator::new();
    let (bridge, queues) = Bridge::new(&config, allocator.clone());
    let host = MirrorHost::new();
    let consumer = NativeConsumer::new(queues, Box::new(host.clone()), &config.consumer).spawn()?;

    {
        let mut adapter = JsElementAdapter::new(bridge.create_context())?;
        adapter.execute(DEMO_SCRIPT)?;
        adapter.collect_garbage();
        adapter.shutdown();
    }
    drop(bridge);

    consumer
        .join()
        .map_err(|_| element_bridge::BridgeError::Consumer("consumer thread panicked".to_string()))?;

    host.with_state(|state| {
        println!("applied {} commands", state.log.len());
        let mut targets: Vec<_> = state.elements.keys().copied().collect();
        targets.sort();
        for target in targets {
            let element = &state.elements[&target];
            println!(
                "{} <{}> {:?} messages={:?}",
                target, element.tag, element.properties, element.messages
            );
        }
    });
    println!("live native elements: {}", allocator.live());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Bridge demo failed: {}", e);
        std::process::exit(1);
    }
}
