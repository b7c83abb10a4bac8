use ethers::prelude::*;

abigen!(
    Greeter,
    r#"[
        event GreetingUpdated(string greeting)
        function greeting() external view returns (string)
        function updateGreeting(string newGreeting) external
    ]"#
);
