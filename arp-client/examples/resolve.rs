use std::env;
use std::net::IpAddr;
use std::process;
use std::time::Duration;

fn usage() -> ! {
    eprintln!("usage: resolve [device] <ipv4-address>");
    process::exit(2);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (device, addr) = match args.as_slice() {
        [addr] => (None, addr),
        [device, addr] => (Some(device.as_str()), addr),
        _ => usage(),
    };
    let ip: IpAddr = match addr.parse() {
        Ok(ip) => ip,
        Err(_) => usage(),
    };

    let mut client = match arp_client::Client::open(device) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("resolve: {}", err);
            process::exit(1);
        }
    };
    // The engine itself never gives up; bound the wait at the socket.
    if let Err(err) = client.set_read_timeout(Some(Duration::from_secs(2))) {
        eprintln!("resolve: {}", err);
        process::exit(1);
    }

    match client.resolve(ip) {
        Ok(mac) => println!("{} is at {}", ip, mac),
        Err(err) => {
            eprintln!("resolve: {}", err);
            process::exit(1);
        }
    }
}
