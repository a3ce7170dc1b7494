use crate::*;

/// A listens, B dials A, B's operator sends "hello".
#[tokio::test]
async fn test_explicit_peer_end_to_end() -> Result<()> {
    let a = start_node().await?;
    let b = start_node().await?;
    let mut a_feed = a.subscribe();

    b.dial(a.self_addr()).context("B should start a link to A")?;
    wait_linked(&b, &a).await?;

    b.originate("hello");
    let got = next_delivery(&mut a_feed).await?;
    assert_eq!(got.body, "hello");
    assert_eq!(got.addr, b.self_addr());
    assert_eq!(got.display_name(), b.self_addr());

    // A dialed back once; later messages from B don't start another link.
    wait_linked(&a, &b).await?;
    b.originate("again");
    assert_eq!(next_delivery(&mut a_feed).await?.body, "again");
    assert!(a.dial(b.self_addr()).is_none());
    assert_eq!(a.registry().addresses(), vec![b.self_addr().to_string()]);
    Ok(())
}

/// Once the reciprocal link is up, traffic flows both ways.
#[tokio::test]
async fn test_reciprocal_link_carries_replies() -> Result<()> {
    let a = start_node().await?;
    let b = start_node().await?;
    let mut a_feed = a.subscribe();
    let mut b_feed = b.subscribe();

    b.dial(a.self_addr());
    wait_linked(&b, &a).await?;
    b.originate("ping");
    next_delivery(&mut a_feed).await?;
    wait_linked(&a, &b).await?;

    let reply = a.originate("pong");
    let got = next_delivery(&mut b_feed).await?;
    assert_eq!(got.id, reply.id);
    assert_eq!(got.body, "pong");

    // B never delivers its own message back to itself.
    assert_quiet(&mut b_feed).await?;
    Ok(())
}

/// A nickname travels with the message and is what gets displayed.
#[tokio::test]
async fn test_nickname_is_carried() -> Result<()> {
    let a = start_node().await?;
    let mut config = loopback_config();
    config.node.nick = "gopher".to_string();
    let b = start_node_with(&config).await?;
    let mut a_feed = a.subscribe();

    b.dial(a.self_addr());
    wait_linked(&b, &a).await?;
    b.originate("hi");

    let got = next_delivery(&mut a_feed).await?;
    assert_eq!(got.nick, "gopher");
    assert_eq!(got.display_name(), "gopher");
    Ok(())
}

/// A dead peer's link closes and frees its registry slot.
#[tokio::test]
async fn test_unreachable_peer_is_removed() -> Result<()> {
    let a = start_node().await?;
    let dead = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        l.local_addr()?.to_string()
    };

    let link = a.dial(&dead).context("first dial should start a link")?;
    link.await?;
    assert!(!a.registry().contains(&dead));
    assert!(a.registry().is_empty());
    Ok(())
}

/// Dialing our own address never opens a link.
#[tokio::test]
async fn test_self_dial_is_refused() -> Result<()> {
    let a = start_node().await?;
    assert!(a.dial(a.self_addr()).is_none());
    assert!(a.registry().is_empty());
    Ok(())
}
